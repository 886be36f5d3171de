//! In-memory shapes of the registry: file records and categories.
//!
//! These are the shapes the registry works with and the ones written verbatim to
//! the flat key-value store (camelCase field names). The structured backend uses
//! its own snake_case shapes, see [`crate::storage::StoredFile`].

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Id of the category created when storage holds none.
pub const DEFAULT_CATEGORY_ID: &str = "main";

/// A file shortcut filed under a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    /// Original file name, including extension.
    pub name: String,
    /// Derived from `name` at ingestion; editable afterwards.
    #[serde(default)]
    pub display_name: String,
    /// Unique within one category's list.
    pub path: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub icon: String,
    /// Id of the owning category. Denormalized copy of the list key.
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub open_count: u64,
    /// Epoch millis. Set once, never overwritten.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

/// A user-defined group of file shortcuts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Reserved for nesting, always `None` for now.
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>, sort_order: i32) -> Self {
        Category {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            icon: None,
            sort_order,
        }
    }
}

/// Current time as epoch milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Generates a file id: epoch millis followed by a short random suffix.
///
/// Unique enough for a single user's shortcut list, not meant to be unguessable.
pub fn new_file_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}{}", now_millis(), &suffix[..9])
}

/// Generates a category id. Ids are never reused, even after deletion.
pub fn new_category_id() -> String {
    format!("cat-{}", Uuid::new_v4().simple())
}
