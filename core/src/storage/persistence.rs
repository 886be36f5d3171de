use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::model::{now_millis, Category, FileRecord};
use crate::naming;
use crate::storage::{KeyValueStore, Result, StructuredStore, CATEGORIES_KEY, FILES_KEY};

/// Persists the registry, preferring the structured store and falling back to
/// the flat key-value store.
///
/// Saves that fail on the structured path still write the flat store, so a
/// transient host error does not lose data. Loads that fail on the structured
/// path read the flat store instead.
#[derive(Clone)]
pub struct Persistence {
    structured: Option<Arc<dyn StructuredStore>>,
    flat: Arc<dyn KeyValueStore>,
    origin: Uuid,
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("structured", &self.structured.is_some())
            .field("origin", &self.origin)
            .finish()
    }
}

impl Persistence {
    /// Flat store only.
    pub fn flat(flat: Arc<dyn KeyValueStore>) -> Self {
        Persistence { structured: None, flat, origin: Uuid::new_v4() }
    }

    /// Structured store with the flat store as fallback.
    pub fn structured(structured: Arc<dyn StructuredStore>, flat: Arc<dyn KeyValueStore>) -> Self {
        Persistence { structured: Some(structured), flat, origin: Uuid::new_v4() }
    }

    /// Identifies this instance in [`StoreChanged`](crate::storage::StoreChanged) events.
    pub fn origin(&self) -> Uuid {
        self.origin
    }

    pub fn has_structured(&self) -> bool {
        self.structured.is_some()
    }

    pub fn flat_store(&self) -> &Arc<dyn KeyValueStore> {
        &self.flat
    }

    /// Saves every category's file list.
    ///
    /// Returns an error only when the flat store had to be written and failed too.
    #[instrument(skip_all)]
    pub async fn save_files(&self, files: &BTreeMap<String, Vec<FileRecord>>) -> Result<()> {
        if let Some(structured) = &self.structured {
            let now = now_millis();
            let rows = files
                .iter()
                .flat_map(|(category, records)| {
                    records.iter().map(move |record| {
                        let mut row = naming::to_stored(record, now);
                        row.category = category.clone();
                        row
                    })
                })
                .collect();
            match structured.save_files(rows).await {
                Ok(()) => {
                    debug!("Files saved to structured store");
                    return Ok(());
                }
                Err(e) => warn!("Structured store failed to save files, writing flat store: {}", e),
            }
        }
        let json = serde_json::to_string(files)?;
        self.write_flat(FILES_KEY, &json).await
    }

    /// Loads all file records. Each record's `category` holds whatever was stored;
    /// reconciling it against known categories is up to the caller.
    #[instrument(skip_all)]
    pub async fn load_files(&self) -> Vec<FileRecord> {
        if let Some(structured) = &self.structured {
            match structured.load_files().await {
                Ok(rows) => {
                    debug!("Loaded {} file rows from structured store", rows.len());
                    return rows.into_iter().map(naming::from_stored).collect();
                }
                Err(e) => warn!("Structured store failed to load files, reading flat store: {}", e),
            }
        }
        self.load_flat_files().await
    }

    /// Saves the category list.
    #[instrument(skip_all)]
    pub async fn save_categories(&self, categories: &[Category]) -> Result<()> {
        if let Some(structured) = &self.structured {
            let rows = categories.iter().map(naming::to_stored_category).collect();
            match structured.save_categories(rows).await {
                Ok(()) => return Ok(()),
                Err(e) => warn!("Structured store failed to save categories, writing flat store: {}", e),
            }
        }
        let json = serde_json::to_string(categories)?;
        self.write_flat(CATEGORIES_KEY, &json).await
    }

    /// Loads the category list, empty when nothing is stored.
    #[instrument(skip_all)]
    pub async fn load_categories(&self) -> Vec<Category> {
        if let Some(structured) = &self.structured {
            match structured.load_categories().await {
                Ok(rows) => return rows.into_iter().map(naming::from_stored_category).collect(),
                Err(e) => warn!("Structured store failed to load categories, reading flat store: {}", e),
            }
        }
        self.load_flat_categories().await
    }

    /// Tells the structured store about a rename. The flat store has no
    /// separate rename; it is covered by the next category save.
    pub async fn rename_category(&self, id: &str, new_name: &str) {
        if let Some(structured) = &self.structured {
            if let Err(e) = structured.rename_category(id, new_name).await {
                warn!("Structured store failed to rename category {}: {}", id, e);
            }
        }
    }

    /// Tells the structured store about a deletion.
    pub async fn delete_category(&self, id: &str) {
        if let Some(structured) = &self.structured {
            if let Err(e) = structured.delete_category(id).await {
                warn!("Structured store failed to delete category {}: {}", id, e);
            }
        }
    }

    /// Reads file records straight from the flat store. Malformed content is
    /// logged and treated as empty.
    pub async fn load_flat_files(&self) -> Vec<FileRecord> {
        let Some(json) = self.read_flat(FILES_KEY).await else {
            return Vec::new();
        };
        match serde_json::from_str::<BTreeMap<String, Vec<FileRecord>>>(&json) {
            Ok(map) => map
                .into_iter()
                .flat_map(|(category, records)| {
                    records.into_iter().map(move |mut record| {
                        record.category = category.clone();
                        record
                    })
                })
                .collect(),
            Err(e) => {
                warn!("Ignoring malformed file slot in flat store: {}", e);
                Vec::new()
            }
        }
    }

    /// Reads categories straight from the flat store.
    pub async fn load_flat_categories(&self) -> Vec<Category> {
        let Some(json) = self.read_flat(CATEGORIES_KEY).await else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<Category>>(&json) {
            Ok(categories) => categories,
            Err(e) => {
                warn!("Ignoring malformed category slot in flat store: {}", e);
                Vec::new()
            }
        }
    }

    async fn read_flat(&self, key: &str) -> Option<String> {
        match self.flat.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read flat store slot {}: {}", key, e);
                None
            }
        }
    }

    async fn write_flat(&self, key: &str, json: &str) -> Result<()> {
        self.flat.set(key, json).await?;
        self.flat.events().notify(key, self.origin);
        debug!("Wrote flat store slot {}", key);
        Ok(())
    }
}
