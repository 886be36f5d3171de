//! The launcher's file/category registry.
//!
//! A [`Registry`] owns the category metadata ([`CategoryRegistry`]), the per-category
//! file lists ([`FileRegistry`]) and an injected [`Persistence`] adapter. Every
//! mutating operation changes the in-memory state first and then saves the current
//! snapshot. Save failures are logged and never undo or abort the operation.
//!
//! Files are grouped by category **id**. Renaming a category therefore never moves
//! file lists.

pub use self::categories::{CategoryRegistry, Removal};
pub use self::files::FileRegistry;
pub use self::ingest::{IngestReport, IngestionPipeline, RawItem};

mod categories;
mod files;
mod ingest;

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::host::{self, Host, HostError};
use crate::model::{now_millis, Category, FileRecord, DEFAULT_CATEGORY_ID};
use crate::naming;
use crate::storage::{self, Persistence, CATEGORIES_KEY, FILES_KEY};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown file: {0}")]
    UnknownFile(String),

    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: HostError,
    },

    #[error("Storage error")]
    Storage(#[from] storage::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub struct Registry {
    categories: CategoryRegistry,
    files: FileRegistry,
    persistence: Persistence,
    host: Option<Arc<dyn Host>>,
    default_category: String,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("categories", &self.categories)
            .field("active", &self.files.active())
            .field("persistence", &self.persistence)
            .field("host", &self.host.is_some())
            .finish()
    }
}

impl Registry {
    /// Creates a registry holding only the default category. Call [`Registry::load`]
    /// to read persisted state.
    pub fn new(persistence: Persistence, host: Option<Arc<dyn Host>>) -> Self {
        Self::with_default_category(persistence, host, DEFAULT_CATEGORY_ID)
    }

    pub fn with_default_category(
        persistence: Persistence,
        host: Option<Arc<dyn Host>>,
        default_category: &str,
    ) -> Self {
        Registry {
            categories: CategoryRegistry::bootstrap(default_category),
            files: FileRegistry::new(default_category),
            persistence,
            host,
            default_category: default_category.to_string(),
        }
    }

    // --- Accessors ---

    pub fn categories(&self) -> &[Category] {
        self.categories.list()
    }

    pub fn category(&self, id_or_name: &str) -> Option<&Category> {
        self.categories.resolve(id_or_name)
    }

    /// Id of the active category.
    pub fn active(&self) -> &str {
        self.files.active()
    }

    pub fn active_files(&self) -> &[FileRecord] {
        self.files.active_files()
    }

    pub fn files(&self, category: &str) -> &[FileRecord] {
        self.files.files(category)
    }

    /// Every list, keyed by category id.
    pub fn all_files(&self) -> &BTreeMap<String, Vec<FileRecord>> {
        self.files.lists()
    }

    pub fn file(&self, category: &str, id: &str) -> Option<&FileRecord> {
        self.files.get(category, id)
    }

    /// Finds a file by id in any category.
    pub fn find_file(&self, id: &str) -> Option<&FileRecord> {
        self.files.lists().values().flatten().find(|f| f.id == id)
    }

    pub fn host(&self) -> Option<&Arc<dyn Host>> {
        self.host.as_ref()
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    /// Identifies this instance among registries sharing a flat store.
    pub fn origin(&self) -> Uuid {
        self.persistence.origin()
    }

    // --- Loading ---

    /// Reads categories and files from storage and repairs what needs repairing:
    /// no stored categories bootstraps the default one (saved right away), files
    /// filed under an unknown category move to the first category, and missing
    /// creation times are backfilled without saving.
    #[instrument(skip(self))]
    pub async fn load(&mut self) {
        let loaded = self.persistence.load_categories().await;
        self.apply_categories(loaded).await;
        let records = self.persistence.load_files().await;
        self.apply_files(records);
        info!(
            "Loaded {} categories and {} files",
            self.categories.len(),
            self.files.lists().values().map(Vec::len).sum::<usize>()
        );
    }

    /// Reloads one flat-store slot after another instance wrote it.
    #[instrument(skip(self))]
    pub async fn reload_slot(&mut self, key: &str) {
        match key {
            FILES_KEY => {
                let records = self.persistence.load_flat_files().await;
                self.apply_files(records);
            }
            CATEGORIES_KEY => {
                let loaded = self.persistence.load_flat_categories().await;
                if loaded.is_empty() {
                    return;
                }
                self.apply_categories(loaded).await;
                let records: Vec<FileRecord> =
                    self.files.lists().values().flatten().cloned().collect();
                self.apply_files(records);
            }
            other => debug!("Ignoring change to unrelated slot {}", other),
        }
    }

    async fn apply_categories(&mut self, loaded: Vec<Category>) {
        match CategoryRegistry::from_loaded(loaded) {
            Some(categories) => self.categories = categories,
            None => {
                info!("No stored categories, creating '{}'", self.default_category);
                self.categories = CategoryRegistry::bootstrap(&self.default_category);
                self.persist_categories().await;
            }
        }
    }

    fn apply_files(&mut self, records: Vec<FileRecord>) {
        let Some(first) = self.categories.first().map(|c| c.id.clone()) else {
            return;
        };
        let now = now_millis();
        let mut lists: BTreeMap<String, Vec<FileRecord>> = self
            .categories
            .list()
            .iter()
            .map(|c| (c.id.clone(), Vec::new()))
            .collect();

        for mut record in records {
            let category = match self.categories.resolve(&record.category) {
                Some(category) => category.id.clone(),
                None => {
                    warn!(
                        "File {} references unknown category '{}', moving it to '{}'",
                        record.path, record.category, first
                    );
                    first.clone()
                }
            };
            record.category = category.clone();
            if record.created_at.is_none() {
                record.created_at = Some(now);
            }
            if record.display_name.is_empty() {
                record.display_name = naming::display_name(&record.name);
            }
            let list = lists.entry(category).or_default();
            if list.iter().any(|f| f.path == record.path) {
                warn!("Dropping duplicate of {} in category {}", record.path, record.category);
                continue;
            }
            list.push(record);
        }

        if !self.categories.contains(self.files.active()) {
            self.files.switch_active(&first);
        }
        self.files.replace_all(lists);
    }

    // --- Files ---

    /// Makes `category` (id or name) the active category. Does not persist.
    pub fn switch_active(&mut self, category: &str) -> Result<()> {
        let id = self
            .categories
            .resolve(category)
            .map(|c| c.id.clone())
            .ok_or_else(|| Error::UnknownCategory(category.to_string()))?;
        self.files.switch_active(&id);
        debug!("Active category is now {}", id);
        Ok(())
    }

    /// Ingests a batch into the active category, skipping paths already filed
    /// there. Saves once if anything was accepted.
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn ingest(&mut self, items: Vec<RawItem>) -> IngestReport {
        let category = self.files.active().to_string();
        self.files.ensure_list(&category);

        let mut report = IngestReport::default();
        {
            let pipeline = IngestionPipeline::new(self.host.as_deref());
            for item in &items {
                let record = pipeline.build(item, &category).await;
                let path = record.path.clone();
                if self.files.insert(record) {
                    report.accepted += 1;
                } else {
                    debug!("Skipping {}, already in {}", path, category);
                    report.skipped += 1;
                }
            }
        }

        if report.accepted > 0 {
            self.persist_files().await;
        }
        info!("Ingested {} files, skipped {}", report.accepted, report.skipped);
        report
    }

    /// Ingests dropped paths, one decoupled single-item batch per path.
    pub async fn ingest_dropped(&mut self, paths: Vec<String>) -> IngestReport {
        let mut report = IngestReport::default();
        for path in paths {
            report += self.ingest(vec![RawItem::from_path(path)]).await;
        }
        report
    }

    /// Removes a file from the active category.
    #[instrument(skip(self))]
    pub async fn delete_file(&mut self, id: &str) -> Result<FileRecord> {
        let category = self.files.active().to_string();
        let removed = self
            .files
            .remove(&category, id)
            .ok_or_else(|| Error::UnknownFile(id.to_string()))?;
        self.persist_files().await;
        Ok(removed)
    }

    /// Opens a file and counts the open. Returns the new open count.
    ///
    /// A failed open is returned for the caller to show; the counter is left alone.
    #[instrument(skip(self))]
    pub async fn open(&mut self, category: &str, id: &str) -> Result<u64> {
        let path = self
            .files
            .get(category, id)
            .map(|f| f.path.clone())
            .ok_or_else(|| Error::UnknownFile(id.to_string()))?;

        let opened = match &self.host {
            Some(host) => host.open_path(&path).await,
            None => host::open_detached(&path),
        };
        if let Err(source) = opened {
            error!("Failed to open {}: {}", path, source);
            return Err(Error::OpenFailed { path, source });
        }

        let count = self
            .files
            .record_open(category, id)
            .ok_or_else(|| Error::UnknownFile(id.to_string()))?;
        // A failed save keeps the new count in memory; the next save carries it.
        self.persist_files().await;
        Ok(count)
    }

    /// Opens the folder containing a file.
    pub async fn reveal(&self, category: &str, id: &str) -> Result<()> {
        let file = self
            .files
            .get(category, id)
            .ok_or_else(|| Error::UnknownFile(id.to_string()))?;
        let host = self.host.as_ref().ok_or_else(|| Error::OpenFailed {
            path: file.path.clone(),
            source: HostError::Launch("no host to reveal files with".into()),
        })?;
        host.reveal_path(&file.path).await.map_err(|source| {
            error!("Failed to reveal {}: {}", file.path, source);
            Error::OpenFailed { path: file.path.clone(), source }
        })
    }

    /// Changes a file's display name.
    pub async fn rename_file(&mut self, category: &str, id: &str, display_name: &str) -> Result<()> {
        let record = self
            .files
            .get_mut(category, id)
            .ok_or_else(|| Error::UnknownFile(id.to_string()))?;
        record.display_name = display_name.trim().to_string();
        self.persist_files().await;
        Ok(())
    }

    // --- Categories ---

    /// Adds a category with an empty file list. Returns `None` when the name is
    /// blank or already used.
    #[instrument(skip(self))]
    pub async fn add_category(&mut self, name: &str) -> Option<Category> {
        let Some(category) = self.categories.add(name).cloned() else {
            warn!("Category '{}' already exists or is blank, not adding", name);
            return None;
        };
        self.files.ensure_list(&category.id);
        self.persist_categories().await;
        Some(category)
    }

    /// Renames a category. Returns `false` when the new name was rejected.
    #[instrument(skip(self))]
    pub async fn rename_category(&mut self, id: &str, new_name: &str) -> Result<bool> {
        let previous = self
            .categories
            .rename(id, new_name)
            .ok_or_else(|| Error::UnknownCategory(id.to_string()))?;
        let current = self.categories.get(id).map(|c| c.name.clone()).unwrap_or_default();
        if current == previous {
            if previous != new_name {
                warn!("Rejected renaming category {} to '{}'", id, new_name);
                return Ok(false);
            }
            return Ok(true);
        }
        self.persistence.rename_category(id, &current).await;
        self.persist_categories().await;
        Ok(true)
    }

    /// Deletes a category and its files. The last remaining category is kept:
    /// the call returns `Ok(false)` and logs a warning.
    #[instrument(skip(self))]
    pub async fn delete_category(&mut self, id: &str) -> Result<bool> {
        match self.categories.remove(id) {
            Removal::Unknown => Err(Error::UnknownCategory(id.to_string())),
            Removal::LastCategory => {
                warn!("Refusing to delete {}, it is the only category", id);
                Ok(false)
            }
            Removal::Removed(category) => {
                let dropped = self.files.drop_category(&category.id);
                debug!("Discarded {} files with category {}", dropped.len(), category.id);
                if self.files.active() == category.id {
                    if let Some(first) = self.categories.first().map(|c| c.id.clone()) {
                        self.files.switch_active(&first);
                    }
                }
                self.persistence.delete_category(&category.id).await;
                self.persist_categories().await;
                self.persist_files().await;
                Ok(true)
            }
        }
    }

    /// Reorders categories to match `ids` and saves.
    pub async fn reorder_categories(&mut self, ids: &[String]) {
        self.categories.reorder(ids);
        self.persist_categories().await;
    }

    // --- Persistence ---

    async fn persist_files(&self) {
        if let Err(e) = self.persistence.save_files(self.files.lists()).await {
            error!("Failed to save files: {}", e);
        }
    }

    async fn persist_categories(&self) {
        if let Err(e) = self.persistence.save_categories(self.categories.list()).await {
            error!("Failed to save categories: {}", e);
        }
    }
}
