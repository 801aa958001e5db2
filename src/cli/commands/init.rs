//! Initialize command.

use console::style;

use crate::config::Settings;

/// Initialize the data directory and database.
pub fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    let store = super::open_store(settings)?;

    println!(
        "{} Initialized MediaSage in {} ({} item(s))",
        style("✓").green(),
        settings.data_dir.display(),
        store.count()?
    );
    Ok(())
}
