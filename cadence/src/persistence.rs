//! Key-value persistence for the phase list and the history.
//!
//! The core only needs two keys. Values are JSON documents; anything that is
//! missing or fails to decode falls back to defaults instead of failing.

use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::StorageError;
use crate::history::{HistoryEntry, HistoryStore};
use crate::phase::PhaseList;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Phases,
    History,
}

impl StoreKey {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::Phases => "phases",
            StoreKey::History => "history",
        }
    }
}

/// Raw read/write contract. Writes are synchronous.
pub trait Store: Send {
    fn read(&self, key: StoreKey) -> Result<Option<String>, StorageError>;
    fn write(&mut self, key: StoreKey, value: &str) -> Result<(), StorageError>;
}

/// One JSON file per key inside a data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Store under the platform data directory.
    pub fn open_default() -> Result<Self, StorageError> {
        Self::new(data_dir()?)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: StoreKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl Store for FileStore {
    fn read(&self, key: StoreKey) -> Result<Option<String>, StorageError> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn write(&mut self, key: StoreKey, value: &str) -> Result<(), StorageError> {
        fs::write(self.path(key), value)?;
        Ok(())
    }
}

/// In-process store for tests and for running without a data directory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<StoreKey, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: StoreKey, value: impl Into<String>) -> Self {
        self.values.insert(key, value.into());
        self
    }
}

impl Store for MemoryStore {
    fn read(&self, key: StoreKey) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(&key).cloned())
    }

    fn write(&mut self, key: StoreKey, value: &str) -> Result<(), StorageError> {
        self.values.insert(key, value.to_string());
        Ok(())
    }
}

pub fn data_dir() -> Result<PathBuf, StorageError> {
    ProjectDirs::from("com", "cadence", "cadence")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(StorageError::NoDataDir)
}

pub fn load_phases(store: &dyn Store) -> PhaseList {
    load(store, StoreKey::Phases).unwrap_or_default()
}

pub fn load_history(store: &dyn Store) -> HistoryStore {
    load::<Vec<HistoryEntry>>(store, StoreKey::History)
        .map(HistoryStore::from_entries)
        .unwrap_or_default()
}

pub fn save<T: Serialize + ?Sized>(
    store: &mut dyn Store,
    key: StoreKey,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(value)?;
    store.write(key, &json)
}

fn load<T: DeserializeOwned>(store: &dyn Store, key: StoreKey) -> Option<T> {
    let raw = match store.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Failed to read {}: {}", key.as_str(), e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Discarding unreadable {}: {}", key.as_str(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::SessionConfig;
    use cadence_ipc::Phase;
    use tempfile::TempDir;

    #[test]
    fn missing_values_fall_back_to_defaults() {
        let store = MemoryStore::new();
        assert_eq!(load_phases(&store), PhaseList::default());
        assert!(load_history(&store).is_empty());
    }

    #[test]
    fn corrupt_values_fall_back_to_defaults() {
        let store = MemoryStore::new()
            .with(StoreKey::Phases, "{not json")
            .with(StoreKey::History, r#"[{"id": "nope"}]"#);
        assert_eq!(load_phases(&store), PhaseList::default());
        assert!(load_history(&store).is_empty());

        let empty = MemoryStore::new().with(StoreKey::Phases, "[]");
        assert_eq!(load_phases(&empty), PhaseList::default());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let phases = PhaseList::new(vec![Phase::new("Read", 40), Phase::new("Walk", 10)]).unwrap();
        let mut history = HistoryStore::default();
        history.record(SessionConfig::Timer { duration_secs: 600 }, 42);

        {
            let mut store = FileStore::new(dir.path()).unwrap();
            save(&mut store, StoreKey::Phases, &phases).unwrap();
            save(&mut store, StoreKey::History, history.entries()).unwrap();
        }

        let store = FileStore::new(dir.path()).unwrap();
        assert!(dir.path().join("phases.json").exists());
        assert_eq!(load_phases(&store), phases);
        assert_eq!(load_history(&store).entries(), history.entries());
    }
}
