//! Display names and translation between the in-memory and persisted shapes.
//!
//! In memory the registry uses `openCount`/`displayName`/`createdAt`; the structured
//! backend persists `open_count`/`display_name`/`created_at`. Only the structured
//! path goes through this module; the flat store keeps in-memory names.

use crate::icon;
use crate::model::{Category, FileRecord};
use crate::storage::{StoredCategory, StoredFile};

// Stripped on top of everything that has an icon mapping.
const EXTRA_STRIPPED: &[&str] = &["sql"];

fn is_stripped(ext: &str) -> bool {
    icon::is_known_extension(ext) || EXTRA_STRIPPED.contains(&ext)
}

/// Derives a display name by removing a recognized extension.
///
/// `report.pdf` becomes `report`; `archive.tar.gz` and `.bashrc` are kept as is.
pub fn display_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && is_stripped(&ext.to_lowercase()) => {
            stem.to_string()
        }
        _ => file_name.to_string(),
    }
}

/// Converts a record to the structured backend's shape.
///
/// An empty display name is synthesized; a missing `created_at` takes `now`.
/// An existing `created_at` is never replaced.
pub fn to_stored(record: &FileRecord, now: i64) -> StoredFile {
    let display_name = if record.display_name.is_empty() {
        display_name(&record.name)
    } else {
        record.display_name.clone()
    };
    StoredFile {
        id: record.id.clone(),
        name: record.name.clone(),
        display_name,
        path: record.path.clone(),
        size: record.size,
        r#type: record.mime_type.clone(),
        icon: record.icon.clone(),
        category: record.category.clone(),
        open_count: record.open_count,
        created_at: Some(record.created_at.unwrap_or(now)),
    }
}

/// Converts a structured-backend row back to the in-memory shape.
pub fn from_stored(stored: StoredFile) -> FileRecord {
    FileRecord {
        id: stored.id,
        name: stored.name,
        display_name: stored.display_name,
        path: stored.path,
        size: stored.size,
        mime_type: stored.r#type,
        icon: stored.icon,
        category: stored.category,
        open_count: stored.open_count,
        created_at: stored.created_at,
    }
}

pub fn to_stored_category(category: &Category) -> StoredCategory {
    StoredCategory {
        id: category.id.clone(),
        parent_id: category.parent_id.clone(),
        name: category.name.clone(),
        icon: category.icon.clone(),
        sort_order: category.sort_order,
    }
}

pub fn from_stored_category(stored: StoredCategory) -> Category {
    Category {
        id: stored.id,
        name: stored.name,
        parent_id: stored.parent_id,
        icon: stored.icon,
        sort_order: stored.sort_order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(display_name: &str, created_at: Option<i64>) -> FileRecord {
        FileRecord {
            id: "1".into(),
            name: "notes.md".into(),
            display_name: display_name.into(),
            path: "/tmp/notes.md".into(),
            size: 3,
            mime_type: "text/markdown".into(),
            icon: "📝".into(),
            category: "main".into(),
            open_count: 4,
            created_at,
        }
    }

    #[test]
    fn test_display_name_strips_recognized_extensions() {
        assert_eq!(display_name("report.pdf"), "report");
        assert_eq!(display_name("query.SQL"), "query");
        assert_eq!(display_name("setup.exe"), "setup");
    }

    #[test]
    fn test_display_name_keeps_unrecognized() {
        assert_eq!(display_name("archive.tar.gz"), "archive.tar.gz");
        assert_eq!(display_name(".bashrc"), ".bashrc");
        assert_eq!(display_name("README"), "README");
    }

    #[test]
    fn test_to_stored_synthesizes_missing_fields() {
        let stored = to_stored(&record("", None), 42);
        assert_eq!(stored.display_name, "notes");
        assert_eq!(stored.created_at, Some(42));
        assert_eq!(stored.open_count, 4);
    }

    #[test]
    fn test_to_stored_never_regenerates_created_at() {
        let stored = to_stored(&record("My notes", Some(7)), 42);
        assert_eq!(stored.created_at, Some(7));
        assert_eq!(stored.display_name, "My notes");
    }

    #[test]
    fn test_stored_json_uses_snake_case() {
        let json = serde_json::to_value(to_stored(&record("n", Some(1)), 0)).unwrap();
        assert_eq!(json["display_name"], "n");
        assert_eq!(json["open_count"], 4);
        assert_eq!(json["type"], "text/markdown");
        assert!(json.get("openCount").is_none());
    }

    #[test]
    fn test_from_stored_restores_record() {
        let original = record("n", Some(1));
        assert_eq!(from_stored(to_stored(&original, 0)), original);
    }
}
