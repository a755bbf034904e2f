//! Journal runtime configuration.
//!
//! Everything is rooted in one data directory. A JSON config file may
//! override individual fields; missing fields keep their defaults.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_DB_FILE_NAME: &str = "devjournal.sqlite3";
const DEFAULT_LEGACY_FILE_NAME: &str = "legacy_storage.json";
const DEFAULT_LOG_DIR_NAME: &str = "logs";

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, message } => {
                write!(f, "cannot read config `{}`: {message}", path.display())
            }
            Self::Parse { path, message } => {
                write!(f, "invalid config `{}`: {message}", path.display())
            }
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub data_dir: PathBuf,
    pub db_file_name: String,
    pub legacy_file_name: String,
    /// Defaults to `<data_dir>/logs`.
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
    /// Directory holding `<year>.md` files for markdown import.
    pub markdown_dir: Option<PathBuf>,
    pub markdown_years: Vec<u16>,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self::for_data_dir(".")
    }
}

impl JournalConfig {
    pub fn for_data_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            db_file_name: DEFAULT_DB_FILE_NAME.to_string(),
            legacy_file_name: DEFAULT_LEGACY_FILE_NAME.to_string(),
            log_dir: None,
            log_level: default_log_level().to_string(),
            markdown_dir: None,
            markdown_years: Vec::new(),
        }
    }

    /// Reads a JSON config file. Relative paths inside it resolve against
    /// the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let mut config: Self = serde_json::from_str(&raw).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

        if let Some(base) = path.parent() {
            config.data_dir = resolve(base, &config.data_dir);
            config.log_dir = config.log_dir.map(|dir| resolve(base, &dir));
            config.markdown_dir = config.markdown_dir.map(|dir| resolve(base, &dir));
        }
        Ok(config)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file_name)
    }

    pub fn legacy_snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.legacy_file_name)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join(DEFAULT_LOG_DIR_NAME))
    }

    pub fn markdown_dir(&self) -> PathBuf {
        self.markdown_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.clone())
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, JournalConfig};

    #[test]
    fn defaults_are_rooted_in_data_dir() {
        let config = JournalConfig::for_data_dir("/var/journal");
        assert_eq!(
            config.db_path().to_str(),
            Some("/var/journal/devjournal.sqlite3")
        );
        assert_eq!(
            config.legacy_snapshot_path().to_str(),
            Some("/var/journal/legacy_storage.json")
        );
        assert_eq!(config.log_dir().to_str(), Some("/var/journal/logs"));
    }

    #[test]
    fn load_fills_missing_fields_and_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devjournal.json");
        std::fs::write(
            &path,
            r#"{"data_dir": "data", "markdown_years": [2024, 2025], "log_level": "warn"}"#,
        )
        .unwrap();

        let config = JournalConfig::load(&path).unwrap();

        assert_eq!(config.data_dir, dir.path().join("data"));
        assert_eq!(config.markdown_years, vec![2024, 2025]);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.db_file_name, "devjournal.sqlite3");
        assert_eq!(config.markdown_dir(), dir.path().join("data"));
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            JournalConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
