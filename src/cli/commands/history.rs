//! History browsing and editing commands.

use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use console::style;

use crate::config::Settings;
use crate::llm::AnalysisClient;
use crate::models::AnalysisItem;
use crate::services::IngestService;
use crate::utils::format_size;

/// List history items, newest first.
pub fn cmd_ls(settings: &Settings, limit: usize, format: &str) -> anyhow::Result<()> {
    let store = super::open_store(settings)?;
    let mut items = store.all_by_recency()?;
    if limit > 0 {
        items.truncate(limit);
    }

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&items)?),
        "ids" => {
            for item in &items {
                println!("{}", item.id());
            }
        }
        "table" => print_table(&items),
        other => bail!("unknown format: {} (expected table, json, or ids)", other),
    }
    Ok(())
}

/// Show one item in full.
pub fn cmd_info(settings: &Settings, id: &str) -> anyhow::Result<()> {
    let store = super::open_store(settings)?;
    let Some(item) = store.get(id)? else {
        bail!("item not found: {}", id);
    };

    println!("{}        {}", style("ID:").bold(), item.id());
    println!("{}      {}", style("Kind:").bold(), item.kind());
    println!("{}   {}", style("Created:").bold(), item.created_at().to_rfc3339());
    println!("{}     {}", style("Title:").bold(), item.title());
    println!("{}      {}", style("Tags:").bold(), item.tags().join(", "));
    if let Some(filename) = item.source_filename() {
        println!("{}      {}", style("File:").bold(), filename);
    }

    match &item {
        AnalysisItem::Text(t) => {
            println!(
                "{}    length={} focus={} format={}",
                style("Config:").bold(),
                t.config.length.as_str(),
                t.config.focus.as_str(),
                t.config.format.as_str()
            );
            println!(
                "{}   {} chars",
                style("Content:").bold(),
                t.original_content.chars().count()
            );
            println!();
            println!("{}", t.summary);
        }
        AnalysisItem::Image(i) => {
            println!(
                "{}     {}",
                style("Image:").bold(),
                format_size(i.encoded_image.len() as u64)
            );
            println!();
            println!("{}", i.description);
        }
    }
    Ok(())
}

/// Edit an item's title or tags.
pub fn cmd_edit(
    settings: &Settings,
    id: &str,
    title: Option<String>,
    tags: Vec<String>,
) -> anyhow::Result<()> {
    let tags = if tags.is_empty() { None } else { Some(tags) };
    if title.is_none() && tags.is_none() {
        bail!("nothing to change: pass --title and/or --tag");
    }

    let store = super::open_store(settings)?;
    let client = Arc::new(AnalysisClient::new(settings.llm.clone()));
    let service = IngestService::new(store, client);

    let item = service.edit(id, title, tags)?;
    println!("{} Updated {}", style("✓").green(), item.id());
    Ok(())
}

/// Re-print the history whenever the stored set changes.
pub async fn cmd_watch(settings: &Settings, interval: u64) -> anyhow::Result<()> {
    let store = super::open_store(settings)?;

    let mut last: Option<Vec<AnalysisItem>> = None;
    loop {
        let items = store.all_by_recency()?;
        if last.as_ref() != Some(&items) {
            println!(
                "{} {} item(s) at {}",
                style("●").cyan(),
                items.len(),
                chrono::Utc::now().to_rfc3339()
            );
            print_table(&items);
            println!();
            last = Some(items);
        }
        tokio::time::sleep(Duration::from_secs(interval.max(1))).await;
    }
}

/// Delete one item.
pub fn cmd_rm(settings: &Settings, id: &str) -> anyhow::Result<()> {
    let store = super::open_store(settings)?;
    if store.delete(id)? {
        println!("{} Deleted {}", style("✓").green(), id);
        Ok(())
    } else {
        bail!("item not found: {}", id);
    }
}

/// Clear the entire history.
pub fn cmd_clear(settings: &Settings, confirm: bool) -> anyhow::Result<()> {
    let store = super::open_store(settings)?;
    let count = store.count()?;

    if !confirm {
        println!(
            "{} This would delete {} item(s) permanently. Re-run with --confirm.",
            style("!").yellow(),
            count
        );
        return Ok(());
    }

    let removed = store.delete_all()?;
    println!("{} Cleared {} item(s)", style("✓").green(), removed);
    Ok(())
}

fn print_table(items: &[AnalysisItem]) {
    if items.is_empty() {
        println!("(history is empty)");
        return;
    }

    println!(
        "{:<36}  {:<5}  {:<20}  {:<32}  TAGS",
        "ID", "KIND", "CREATED", "TITLE"
    );
    for item in items {
        println!(
            "{:<36}  {:<5}  {:<20}  {:<32}  {}",
            item.id(),
            item.kind(),
            item.created_at().format("%Y-%m-%d %H:%M:%S"),
            truncate(item.title(), 32),
            item.tags().join(",")
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}
