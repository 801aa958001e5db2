//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific
//! modules.

mod analyze;
mod history;
mod init;
mod transfer;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::config::{LoadOptions, Settings};
use crate::models::{SummaryFocus, SummaryFormat, SummaryLength};
use crate::repository::HistoryStore;

#[derive(Parser)]
#[command(name = "sage")]
#[command(about = "Multimedia content analysis with a durable local history")]
#[command(version)]
pub struct Cli {
    /// Target directory or database file (overrides config file).
    /// Can be a directory containing mediasage.db or a .db file directly.
    #[arg(long, short = 't', global = true)]
    target: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Analyze a file (txt, pdf, docx, or image) and store the result
    Analyze {
        /// File to analyze
        file: PathBuf,
        /// Declared MIME type (derived from the filename if not specified)
        #[arg(short = 'T', long)]
        content_type: Option<String>,
        /// Title for the stored item (defaults to the filename)
        #[arg(long)]
        title: Option<String>,
        /// Tag for the stored item (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Summary length
        #[arg(long, value_enum, default_value = "medium")]
        length: SummaryLength,
        /// Summary focus
        #[arg(long, value_enum, default_value = "informative")]
        focus: SummaryFocus,
        /// Summary format
        #[arg(long, value_enum, default_value = "paragraph")]
        format: SummaryFormat,
    },

    /// Summarize text read from stdin
    Text {
        /// Title for the stored item
        #[arg(long)]
        title: Option<String>,
        /// Tag for the stored item (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Summary length
        #[arg(long, value_enum, default_value = "medium")]
        length: SummaryLength,
        /// Summary focus
        #[arg(long, value_enum, default_value = "informative")]
        focus: SummaryFocus,
        /// Summary format
        #[arg(long, value_enum, default_value = "paragraph")]
        format: SummaryFormat,
    },

    /// Refine an item's summary or description with feedback
    Refine {
        /// Item ID
        id: String,
        /// What should change
        feedback: String,
        /// Additional refinement instructions
        #[arg(short, long, default_value = "")]
        instructions: String,
    },

    /// Edit an item's title or tags
    Edit {
        /// Item ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// Replacement tag set (repeatable; omit to leave tags untouched)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// List history items, newest first
    Ls {
        /// Limit number of results (0 = unlimited)
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Output format (table, json, ids)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show item metadata and generated output
    Info {
        /// Item ID
        id: String,
    },

    /// Re-print the history whenever it changes
    Watch {
        /// Refresh interval in seconds
        #[arg(long, default_value = "5")]
        interval: u64,
    },

    /// Delete one item from the history
    Rm {
        /// Item ID
        id: String,
    },

    /// Clear the entire history
    Clear {
        /// Confirm clearing
        #[arg(long)]
        confirm: bool,
    },

    /// Export the full history to a JSON document
    Export {
        /// Output file (default: mediasage-history.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a previously exported history document
    Import {
        /// History document to import
        file: PathBuf,
    },
}

/// Open the history store at the configured location.
fn open_store(settings: &Settings) -> anyhow::Result<Arc<HistoryStore>> {
    settings.ensure_directories()?;
    Ok(Arc::new(HistoryStore::open(&settings.db_path())?))
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(LoadOptions {
        config_path: cli.config,
        target: cli.target,
    });

    match cli.command {
        Commands::Init => init::cmd_init(&settings),
        Commands::Analyze {
            file,
            content_type,
            title,
            tags,
            length,
            focus,
            format,
        } => {
            analyze::cmd_analyze(
                &settings,
                &file,
                content_type,
                title,
                tags,
                crate::models::SummarizeConfig {
                    length,
                    focus,
                    format,
                },
            )
            .await
        }
        Commands::Text {
            title,
            tags,
            length,
            focus,
            format,
        } => {
            analyze::cmd_text(
                &settings,
                title,
                tags,
                crate::models::SummarizeConfig {
                    length,
                    focus,
                    format,
                },
            )
            .await
        }
        Commands::Refine {
            id,
            feedback,
            instructions,
        } => analyze::cmd_refine(&settings, &id, &feedback, &instructions).await,
        Commands::Edit { id, title, tags } => history::cmd_edit(&settings, &id, title, tags),
        Commands::Ls { limit, format } => history::cmd_ls(&settings, limit, &format),
        Commands::Info { id } => history::cmd_info(&settings, &id),
        Commands::Watch { interval } => history::cmd_watch(&settings, interval).await,
        Commands::Rm { id } => history::cmd_rm(&settings, &id),
        Commands::Clear { confirm } => history::cmd_clear(&settings, confirm),
        Commands::Export { output } => transfer::cmd_export(&settings, output.as_deref()),
        Commands::Import { file } => transfer::cmd_import(&settings, &file),
    }
}
