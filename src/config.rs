//! Configuration management.
//!
//! Settings come from an optional TOML file, environment overrides, and
//! the CLI's `--target` flag, in that order. Missing or malformed config
//! files fall back to defaults rather than aborting.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm::LlmConfig;

pub const DEFAULT_DATABASE_FILENAME: &str = "mediasage.db";
const CONFIG_FILENAME: &str = "mediasage.toml";

/// Application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Analysis service configuration.
    pub llm: LlmConfig,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: local data dir -> home dir -> current dir
        let data_dir = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mediasage");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            llm: LlmConfig::default(),
        }
    }
}

/// How to locate and override settings.
#[derive(Debug, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory or `.db` file to operate on.
    pub target: Option<PathBuf>,
}

impl Settings {
    /// Load settings with the given options.
    pub fn load(options: LoadOptions) -> Self {
        let config_path = options
            .config_path
            .or_else(|| std::env::var("MEDIASAGE_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| Self::default().data_dir.join(CONFIG_FILENAME));

        let mut settings = Self::from_file(&config_path).unwrap_or_default();

        if let Ok(dir) = std::env::var("MEDIASAGE_DATA_DIR") {
            settings.data_dir = expand_path(&dir);
        }
        settings.llm = settings.llm.with_env_overrides();

        if let Some(target) = &options.target {
            settings.apply_target(target);
        }
        settings
    }

    fn from_file(path: &Path) -> Option<Self> {
        let raw = fs::read_to_string(path).ok()?;
        match toml::from_str::<Settings>(&raw) {
            Ok(mut settings) => {
                settings.data_dir = expand_path(&settings.data_dir.to_string_lossy());
                Some(settings)
            }
            Err(e) => {
                warn!("Ignoring malformed config {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Point settings at a data directory, or a `.db` file directly.
    fn apply_target(&mut self, target: &Path) {
        if target.extension().is_some_and(|ext| ext == "db") {
            if let Some(parent) = target.parent() {
                if !parent.as_os_str().is_empty() {
                    self.data_dir = parent.to_path_buf();
                }
            }
            if let Some(name) = target.file_name() {
                self.database_filename = name.to_string_lossy().to_string();
            }
        } else {
            self.data_dir = target.to_path_buf();
        }
    }

    /// Full path of the history database.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Create the data directory if it does not exist yet.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir)
    }
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.data_dir.ends_with("mediasage"));
        assert_eq!(settings.database_filename, DEFAULT_DATABASE_FILENAME);
        assert!(settings.db_path().ends_with("mediasage/mediasage.db"));
    }

    #[test]
    fn test_target_directory_override() {
        let mut settings = Settings::default();
        settings.apply_target(Path::new("/tmp/sage-data"));
        assert_eq!(settings.data_dir, PathBuf::from("/tmp/sage-data"));
        assert_eq!(settings.database_filename, DEFAULT_DATABASE_FILENAME);
    }

    #[test]
    fn test_target_db_file_override() {
        let mut settings = Settings::default();
        settings.apply_target(Path::new("/tmp/elsewhere/other.db"));
        assert_eq!(settings.data_dir, PathBuf::from("/tmp/elsewhere"));
        assert_eq!(settings.database_filename, "other.db");
    }

    #[test]
    fn test_settings_from_toml() {
        let parsed: Settings = toml::from_str(
            r#"
            data_dir = "/srv/sage"
            database_filename = "history.db"

            [llm]
            model = "llama3.2:3b"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.data_dir, PathBuf::from("/srv/sage"));
        assert_eq!(parsed.database_filename, "history.db");
        assert_eq!(parsed.llm.model, "llama3.2:3b");
        // unspecified llm fields keep their defaults
        assert!(parsed.llm.enabled);
    }
}
