//! Analyze and refine commands.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use console::style;
use indicatif::ProgressBar;

use crate::config::Settings;
use crate::ingest::{classify, FileKind};
use crate::llm::AnalysisClient;
use crate::models::{AnalysisItem, SummarizeConfig};
use crate::services::{IngestRequest, IngestService};

/// Analyze one file and store the result.
pub async fn cmd_analyze(
    settings: &Settings,
    file: &Path,
    content_type: Option<String>,
    title: Option<String>,
    tags: Vec<String>,
    config: SummarizeConfig,
) -> anyhow::Result<()> {
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string());
    let mime_type = content_type.unwrap_or_else(|| {
        mime_guess::from_path(file)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    });

    // Classification runs before the file is read, so unsupported uploads
    // are rejected without touching their bytes.
    if let FileKind::Unsupported(reason) = classify(&mime_type, &filename) {
        bail!("{}: {}", filename, reason);
    }

    let bytes = std::fs::read(file)?;
    let service = ingest_service(settings).await?;

    let spinner = spinner(&format!("Analyzing {}...", filename));
    let result = service
        .ingest(IngestRequest {
            filename: &filename,
            mime_type: &mime_type,
            bytes: &bytes,
            title,
            tags: non_empty(tags),
            config,
        })
        .await;
    spinner.finish_and_clear();

    let item = result?;
    print_stored(&item);
    Ok(())
}

/// Summarize text read from stdin.
pub async fn cmd_text(
    settings: &Settings,
    title: Option<String>,
    tags: Vec<String>,
    config: SummarizeConfig,
) -> anyhow::Result<()> {
    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text)?;
    if text.trim().is_empty() {
        bail!("no text on stdin");
    }

    let service = ingest_service(settings).await?;

    let spinner = spinner("Summarizing...");
    let result = service
        .ingest_text(text, config, title, non_empty(tags))
        .await;
    spinner.finish_and_clear();

    let item = result?;
    print_stored(&item);
    Ok(())
}

/// Rewrite an item's summary or description from feedback.
pub async fn cmd_refine(
    settings: &Settings,
    id: &str,
    feedback: &str,
    instructions: &str,
) -> anyhow::Result<()> {
    let service = ingest_service(settings).await?;

    let spinner = spinner("Refining...");
    let result = service.refine(id, feedback, instructions).await;
    spinner.finish_and_clear();

    let item = result?;
    println!("{} Refined {}", style("✓").green(), item.id());
    println!();
    println!("{}", item.generated());
    Ok(())
}

async fn ingest_service(settings: &Settings) -> anyhow::Result<IngestService> {
    let store = super::open_store(settings)?;
    let client = Arc::new(AnalysisClient::new(settings.llm.clone()));

    if !client.is_available().await {
        println!(
            "{} Analysis service not reachable at {}",
            style("!").yellow(),
            settings.llm.endpoint
        );
    }

    Ok(IngestService::new(store, client))
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn non_empty(tags: Vec<String>) -> Option<Vec<String>> {
    if tags.is_empty() {
        None
    } else {
        Some(tags)
    }
}

fn print_stored(item: &AnalysisItem) {
    println!(
        "{} Stored {} item {} ({})",
        style("✓").green(),
        item.kind(),
        item.id(),
        item.title()
    );
    println!();
    println!("{}", item.generated());
}
