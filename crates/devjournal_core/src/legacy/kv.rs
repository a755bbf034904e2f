//! Flat key-value storage that held the pre-SQLite journal snapshot.
//!
//! # Invariants
//! - Values are opaque strings; callers own their encoding.
//! - `FileKeyValueStore` rewrites the whole file on every mutation via a
//!   temp file + rename, so a crash never leaves a half-written map.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

pub type LegacyStoreResult<T> = Result<T, LegacyStoreError>;

#[derive(Debug)]
pub enum LegacyStoreError {
    Io { path: PathBuf, source: io::Error },
    Corrupt { path: PathBuf, message: String },
}

impl Display for LegacyStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "legacy storage `{}` I/O failure: {source}", path.display())
            }
            Self::Corrupt { path, message } => {
                write!(f, "legacy storage `{}` is corrupt: {message}", path.display())
            }
        }
    }
}

impl Error for LegacyStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Corrupt { .. } => None,
        }
    }
}

/// Minimal string key-value contract of the legacy storage mechanism.
pub trait LegacyKeyValueStore {
    fn get_item(&self, key: &str) -> LegacyStoreResult<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> LegacyStoreResult<()>;
    /// Removing a missing key is a no-op.
    fn remove_item(&mut self, key: &str) -> LegacyStoreResult<()>;
}

/// In-process legacy store, used by tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    items: BTreeMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.items.insert(key.to_string(), value.to_string());
        store
    }
}

impl LegacyKeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> LegacyStoreResult<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> LegacyStoreResult<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> LegacyStoreResult<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// Legacy store persisted as one JSON object of string values.
///
/// A missing file reads as an empty store.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    path: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> LegacyStoreResult<BTreeMap<String, String>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(LegacyStoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|err| LegacyStoreError::Corrupt {
            path: self.path.clone(),
            message: err.to_string(),
        })
    }

    fn save(&self, items: &BTreeMap<String, String>) -> LegacyStoreResult<()> {
        let io_err = |source: io::Error| LegacyStoreError::Io {
            path: self.path.clone(),
            source,
        };
        let encoded = serde_json::to_string_pretty(items).map_err(|err| {
            LegacyStoreError::Corrupt {
                path: self.path.clone(),
                message: err.to_string(),
            }
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, encoded).map_err(io_err)?;
        std::fs::rename(&tmp_path, &self.path).map_err(io_err)
    }
}

impl LegacyKeyValueStore for FileKeyValueStore {
    fn get_item(&self, key: &str) -> LegacyStoreResult<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> LegacyStoreResult<()> {
        let mut items = self.load()?;
        items.insert(key.to_string(), value.to_string());
        self.save(&items)
    }

    fn remove_item(&mut self, key: &str) -> LegacyStoreResult<()> {
        let mut items = self.load()?;
        if items.remove(key).is_none() {
            return Ok(());
        }
        self.save(&items)
    }
}

#[cfg(test)]
mod tests {
    use super::{FileKeyValueStore, LegacyKeyValueStore, LegacyStoreError};

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path().join("legacy.json"));
        assert_eq!(store.get_item("journalEntries").unwrap(), None);
    }

    #[test]
    fn set_get_remove_persist_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("legacy.json");

        let mut first = FileKeyValueStore::new(&path);
        first.set_item("journalEntries", "[]").unwrap();
        first.set_item("theme", "dark").unwrap();

        let mut second = FileKeyValueStore::new(&path);
        assert_eq!(
            second.get_item("journalEntries").unwrap().as_deref(),
            Some("[]")
        );
        second.remove_item("journalEntries").unwrap();
        second.remove_item("journalEntries").unwrap();

        assert_eq!(first.get_item("journalEntries").unwrap(), None);
        assert_eq!(first.get_item("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn non_object_file_is_reported_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let err = FileKeyValueStore::new(&path)
            .get_item("journalEntries")
            .unwrap_err();
        assert!(matches!(err, LegacyStoreError::Corrupt { .. }));
    }
}
