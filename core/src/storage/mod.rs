//! Persistence for the registry.
//!
//! Two kinds of backend sit behind the [`Persistence`] adapter:
//!
//! *   **[`StructuredStore`]:** a host-provided database. [`SqliteStore`] is the
//!     implementation shipped with this crate. Rows use snake_case field names
//!     ([`StoredFile`], [`StoredCategory`]).
//! *   **[`KeyValueStore`]:** a flat store of string slots holding JSON, used on its
//!     own when no structured store is configured and as the fallback whenever the
//!     structured store fails. Values keep the in-memory field names.
//!     [`JsonFileStore`] keeps one file per slot, [`MemoryStore`] keeps them in
//!     process.
//!
//! Every write to a key-value store notifies the store's [`StoreEvents`], which is
//! how several registry instances sharing one store keep each other up to date.

pub use self::flat::{JsonFileStore, MemoryStore};
pub use self::persistence::Persistence;
pub use self::sqlite::SqliteStore;

mod flat;
mod persistence;
mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::event::{define_event_listeners, Event};

/// Slot holding the JSON map of category id to file records.
pub const FILES_KEY: &str = "launchdeck_files";
/// Slot holding the JSON list of categories.
pub const CATEGORIES_KEY: &str = "launchdeck_categories";

#[derive(Debug, Error)]
pub enum Error {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A file row as persisted by the structured backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub path: String,
    pub size: u64,
    pub r#type: String,
    pub icon: String,
    pub category: String,
    pub open_count: u64,
    pub created_at: Option<i64>,
}

/// A category row as persisted by the structured backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCategory {
    pub id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub icon: Option<String>,
    pub sort_order: i32,
}

/// A database-like backend owned by the host.
///
/// Saves replace the whole collection. Loads return an empty list when
/// nothing was stored yet.
#[async_trait]
pub trait StructuredStore: Send + Sync {
    async fn save_files(&self, files: Vec<StoredFile>) -> Result<()>;
    async fn load_files(&self) -> Result<Vec<StoredFile>>;
    async fn save_categories(&self, categories: Vec<StoredCategory>) -> Result<()>;
    async fn load_categories(&self) -> Result<Vec<StoredCategory>>;
    async fn rename_category(&self, id: &str, new_name: &str) -> Result<()>;
    /// Removes the category and every file row filed under it.
    async fn delete_category(&self, id: &str) -> Result<()>;
}

/// A flat store of string slots.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Listeners notified after every successful `set`.
    fn events(&self) -> &StoreEvents;
}

/// A slot of a key-value store was written.
#[derive(Debug, Clone)]
pub struct StoreChanged {
    pub key: String,
    /// Identifies the writer, so it can ignore its own writes.
    pub origin: Uuid,
}

impl Event for StoreChanged {}

define_event_listeners! {
    /// Change notifications of a [`KeyValueStore`].
    StoreEvents {
        changed: StoreChanged,
    }
}

impl StoreEvents {
    pub(crate) fn notify(&self, key: &str, origin: Uuid) {
        self.changed.dispatch(&StoreChanged { key: key.to_string(), origin });
    }
}
