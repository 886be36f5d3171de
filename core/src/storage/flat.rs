use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument};

use crate::storage::{Error, KeyValueStore, Result, StoreEvents};

/// Key-value store keeping one `<key>.json` file per slot in a directory.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    events: StoreEvents,
}

impl JsonFileStore {
    /// Opens the store, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        debug!("Opened flat store at {}", dir.display());
        Ok(JsonFileStore { dir, events: StoreEvents::new() })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(Error::Unavailable(format!("Invalid slot key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    #[instrument(skip(self, value), fields(dir = %self.dir.display()))]
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        // Write then rename, so a reader never sees half a slot
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        debug!("Wrote {} bytes to slot", value.len());
        Ok(())
    }

    fn events(&self) -> &StoreEvents {
        &self.events
    }
}

/// Key-value store living in process memory.
///
/// Several registry instances sharing one `Arc<MemoryStore>` behave like several
/// windows sharing browser local storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
    events: StoreEvents,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let slots = self.slots.lock().map_err(|_| Error::Unavailable("memory store lock poisoned".into()))?;
        Ok(slots.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut slots = self.slots.lock().map_err(|_| Error::Unavailable("memory store lock poisoned".into()))?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn events(&self) -> &StoreEvents {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_json_file_store_roundtrip() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("store")).await.unwrap();

        assert_eq!(store.get("launchdeck_files").await.unwrap(), None);
        store.set("launchdeck_files", "{\"main\":[]}").await.unwrap();
        assert_eq!(store.get("launchdeck_files").await.unwrap().as_deref(), Some("{\"main\":[]}"));
        assert!(dir.path().join("store/launchdeck_files.json").is_file());
    }

    #[tokio::test]
    async fn test_json_file_store_rejects_path_keys() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();
        assert!(matches!(store.set("../escape", "x").await, Err(Error::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_memory_store_overwrites() {
        let store = MemoryStore::new();
        store.set("k", "1").await.unwrap();
        store.set("k", "2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("2"));
    }
}
