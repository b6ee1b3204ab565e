//! Persistent key-value storage for small integers (the best score, today).
//!
//! Gameplay code only sees the [`KeyValueStore`] trait. Native builds back it with a RON file in
//! the per-user data directory; wasm builds and tests use the in-memory [`MemoryStore`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bevy::log::warn;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub trait KeyValueStore: Send + Sync + 'static {
    /// `Ok(None)` means the key has never been written.
    fn get_integer(&self, key: &str) -> Result<Option<i64>, StoreError>;
    fn set_integer(&mut self, key: &str, value: i64) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, i64>,
}

impl KeyValueStore for MemoryStore {
    fn get_integer(&self, key: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.values.get(key).copied())
    }

    fn set_integer(&mut self, key: &str, value: i64) -> Result<(), StoreError> {
        self.values.insert(key.to_owned(), value);
        Ok(())
    }
}

/// Whole-file store: every write rewrites the map and swaps it into place with a rename, so a crash
/// mid-write leaves the previous file intact.
#[derive(Debug, Clone)]
pub struct RonFileStore {
    path: PathBuf,
}

impl RonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/teus_run/defaults.ron`, or the working directory when the platform has no
    /// data directory.
    pub fn in_user_data_dir() -> Self {
        let path = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("teus_run")
            .join("defaults.ron");
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, i64>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(ron::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl KeyValueStore for RonFileStore {
    fn get_integer(&self, key: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.read_all()?.get(key).copied())
    }

    /// A corrupt file is replaced rather than blocking every later write.
    fn set_integer(&mut self, key: &str, value: i64) -> Result<(), StoreError> {
        let mut values = match self.read_all() {
            Ok(values) => values,
            Err(StoreError::Parse(e)) => {
                warn!("Discarding unreadable {}: {}", self.path.display(), e);
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        values.insert(key.to_owned(), value);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let text = ron::ser::to_string_pretty(&values, ron::ser::PrettyConfig::new())?;
        let tmp = self.path.with_extension("ron.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_reports_unset_keys() {
        let mut store = MemoryStore::default();
        assert_eq!(store.get_integer("HighScore").unwrap(), None);
        store.set_integer("HighScore", 1005).unwrap();
        assert_eq!(store.get_integer("HighScore").unwrap(), Some(1005));
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("defaults.ron");

        let mut store = RonFileStore::new(&path);
        assert_eq!(store.get_integer("HighScore").unwrap(), None);
        store.set_integer("HighScore", 42).unwrap();
        store.set_integer("Other", 7).unwrap();

        let reopened = RonFileStore::new(&path);
        assert_eq!(reopened.get_integer("HighScore").unwrap(), Some(42));
        assert_eq!(reopened.get_integer("Other").unwrap(), Some(7));
        assert!(!path.with_extension("ron.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.ron");
        fs::write(&path, "{ \"HighScore\": ").unwrap();

        let store = RonFileStore::new(&path);
        assert!(matches!(store.get_integer("HighScore"), Err(StoreError::Parse(_))));
    }

    #[test]
    fn write_replaces_a_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.ron");
        fs::write(&path, "garbage{").unwrap();

        let mut store = RonFileStore::new(&path);
        assert!(store.set_integer("HighScore", 4).is_ok());
        assert_eq!(store.get_integer("HighScore").unwrap(), Some(4));

        store.set_integer("HighScore", 9).unwrap();
        assert_eq!(RonFileStore::new(&path).get_integer("HighScore").unwrap(), Some(9));
    }
}
