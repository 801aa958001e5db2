//! Export and import commands.

use std::path::Path;

use console::style;

use crate::config::Settings;
use crate::services::{TransferEngine, EXPORT_FILENAME};

/// Export the full history to a JSON document.
pub fn cmd_export(settings: &Settings, output: Option<&Path>) -> anyhow::Result<()> {
    let store = super::open_store(settings)?;
    let count = store.count()?;

    let document = TransferEngine::new(store).export()?;
    let path = output.unwrap_or_else(|| Path::new(EXPORT_FILENAME));
    std::fs::write(path, document)?;

    println!(
        "{} Exported {} item(s) to {}",
        style("✓").green(),
        count,
        path.display()
    );
    Ok(())
}

/// Import a previously exported history document.
pub fn cmd_import(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let document = std::fs::read_to_string(file)?;
    let store = super::open_store(settings)?;

    let imported = TransferEngine::new(store).import(&document)?;
    println!(
        "{} Imported {} item(s) from {}",
        style("✓").green(),
        imported,
        file.display()
    );
    Ok(())
}
