use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tracing::{debug, instrument};

use crate::storage::{Error, Result, StoredCategory, StoredFile, StructuredStore};

const FILE_COLUMNS: &[(&str, &str)] = &[
    ("display_name", "TEXT NOT NULL DEFAULT ''"),
    ("size", "INTEGER NOT NULL DEFAULT 0"),
    ("type", "TEXT NOT NULL DEFAULT ''"),
    ("icon", "TEXT NOT NULL DEFAULT ''"),
    ("category", "TEXT NOT NULL DEFAULT 'main'"),
    ("open_count", "INTEGER NOT NULL DEFAULT 0"),
    ("created_at", "INTEGER"),
];

const CATEGORY_COLUMNS: &[(&str, &str)] = &[
    ("parent_id", "TEXT"),
    ("icon", "TEXT"),
    ("sort_order", "INTEGER NOT NULL DEFAULT 0"),
];

/// Structured store backed by a single SQLite database file.
///
/// rusqlite is synchronous, so every call runs on tokio's blocking pool.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Opens (or creates) the database and brings its schema up to date.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        debug!("Opened SQLite store at {}", path.display());
        Self::with_schema(conn)
    }

    /// In-memory database, gone when the store is dropped.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_schema(Connection::open_in_memory()?)
    }

    fn with_schema(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(SqliteStore { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| Error::Unavailable("SQLite connection lock poisoned".into()))?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| Error::Unavailable(format!("SQLite task failed: {e}")))?
    }
}

fn replace_files(conn: &mut Connection, files: &[StoredFile]) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM files", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO files
                (id, name, display_name, path, size, type, icon, category, open_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;
        for file in files {
            stmt.execute(params![
                file.id,
                file.name,
                file.display_name,
                file.path,
                file.size as i64,
                file.r#type,
                file.icon,
                file.category,
                file.open_count as i64,
                file.created_at,
            ])?;
        }
    }
    tx.commit()?;
    debug!("Saved {} file rows", files.len());
    Ok(())
}

fn select_files(conn: &Connection) -> Result<Vec<StoredFile>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, display_name, path, size, type, icon, category, open_count, created_at
         FROM files ORDER BY rowid",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(StoredFile {
            id: row.get(0)?,
            name: row.get(1)?,
            display_name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            path: row.get(3)?,
            size: row.get::<_, Option<i64>>(4)?.unwrap_or_default().max(0) as u64,
            r#type: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            icon: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            category: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
            open_count: row.get::<_, Option<i64>>(8)?.unwrap_or_default().max(0) as u64,
            created_at: row.get(9)?,
        })
    })?;
    let files = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(files)
}

fn replace_categories(conn: &mut Connection, categories: &[StoredCategory]) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM categories", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO categories (id, parent_id, name, icon, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for category in categories {
            stmt.execute(params![
                category.id,
                category.parent_id,
                category.name,
                category.icon,
                category.sort_order,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn select_categories(conn: &Connection) -> Result<Vec<StoredCategory>> {
    let mut stmt = conn.prepare(
        "SELECT id, parent_id, name, icon, sort_order FROM categories ORDER BY sort_order, rowid",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(StoredCategory {
            id: row.get(0)?,
            parent_id: row.get(1)?,
            name: row.get(2)?,
            icon: row.get(3)?,
            sort_order: row.get(4)?,
        })
    })?;
    let categories = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(categories)
}

fn remove_category(conn: &mut Connection, id: &str) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
    let removed = tx.execute("DELETE FROM files WHERE category = ?1", params![id])?;
    tx.commit()?;
    debug!("Deleted category {} and {} file rows", id, removed);
    Ok(())
}

#[async_trait]
impl StructuredStore for SqliteStore {
    #[instrument(skip_all, fields(count = files.len()))]
    async fn save_files(&self, files: Vec<StoredFile>) -> Result<()> {
        self.with_connection(move |conn| replace_files(conn, &files)).await
    }

    async fn load_files(&self) -> Result<Vec<StoredFile>> {
        self.with_connection(|conn| select_files(conn)).await
    }

    #[instrument(skip_all, fields(count = categories.len()))]
    async fn save_categories(&self, categories: Vec<StoredCategory>) -> Result<()> {
        self.with_connection(move |conn| replace_categories(conn, &categories)).await
    }

    async fn load_categories(&self) -> Result<Vec<StoredCategory>> {
        self.with_connection(|conn| select_categories(conn)).await
    }

    #[instrument(skip(self))]
    async fn rename_category(&self, id: &str, new_name: &str) -> Result<()> {
        let (id, new_name) = (id.to_string(), new_name.to_string());
        self.with_connection(move |conn| {
            conn.execute("UPDATE categories SET name = ?1 WHERE id = ?2", params![new_name, id])?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete_category(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.with_connection(move |conn| remove_category(conn, &id)).await
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS files (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            display_name TEXT NOT NULL DEFAULT '',
            path TEXT NOT NULL,
            size INTEGER NOT NULL DEFAULT 0,
            type TEXT NOT NULL DEFAULT '',
            icon TEXT NOT NULL DEFAULT '',
            category TEXT NOT NULL DEFAULT 'main',
            open_count INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            parent_id TEXT,
            name TEXT NOT NULL,
            icon TEXT,
            sort_order INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    // Databases written by older versions may lack later columns
    add_missing_columns(conn, "files", FILE_COLUMNS)?;
    add_missing_columns(conn, "categories", CATEGORY_COLUMNS)?;
    Ok(())
}

fn add_missing_columns(conn: &Connection, table: &str, columns: &[(&str, &str)]) -> Result<()> {
    let existing = {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
        let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
        names.collect::<rusqlite::Result<Vec<_>>>()?
    };
    for (name, definition) in columns {
        if !existing.iter().any(|c| c == name) {
            debug!("Adding missing column {}.{}", table, name);
            conn.execute(&format!("ALTER TABLE {table} ADD COLUMN {name} {definition}"), [])?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn stored(id: &str, path: &str, category: &str) -> StoredFile {
        StoredFile {
            id: id.into(),
            name: "a.txt".into(),
            display_name: "a".into(),
            path: path.into(),
            size: 1,
            r#type: "text/plain".into(),
            icon: "📝".into(),
            category: category.into(),
            open_count: 3,
            created_at: Some(99),
        }
    }

    #[tokio::test]
    async fn test_save_replaces_all_rows() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_files(vec![stored("1", "/a", "main"), stored("2", "/b", "main")]).await.unwrap();
        store.save_files(vec![stored("3", "/c", "main")]).await.unwrap();

        let files = store.load_files().await.unwrap();
        assert_eq!(files, vec![stored("3", "/c", "main")]);
    }

    #[tokio::test]
    async fn test_categories_load_in_sort_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        let cat = |id: &str, order| StoredCategory {
            id: id.into(),
            parent_id: None,
            name: id.to_uppercase(),
            icon: None,
            sort_order: order,
        };
        store.save_categories(vec![cat("b", 1), cat("a", 0)]).await.unwrap();
        let loaded = store.load_categories().await.unwrap();
        assert_eq!(loaded.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);

        store.rename_category("a", "Apps").await.unwrap();
        assert_eq!(store.load_categories().await.unwrap()[0].name, "Apps");
    }

    #[tokio::test]
    async fn test_delete_category_drops_its_files() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_files(vec![stored("1", "/a", "main"), stored("2", "/b", "work")]).await.unwrap();
        store.delete_category("work").await.unwrap();
        let files = store.load_files().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].category, "main");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_saves_from_spawned_tasks() {
        let store = SqliteStore::open_in_memory().unwrap();
        let tasks: Vec<_> = (0..4)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let id = i.to_string();
                    store.save_files(vec![stored(&id, &format!("/{id}"), "main")]).await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        // Each save replaces the table, so exactly one row survives
        assert_eq!(store.load_files().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_old_schema_gets_missing_columns() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("old.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute(
                "CREATE TABLE files (id TEXT PRIMARY KEY, name TEXT NOT NULL, path TEXT NOT NULL)",
                [],
            )
            .unwrap();
            conn.execute("INSERT INTO files (id, name, path) VALUES ('1', 'x.md', '/x.md')", []).unwrap();
            conn.execute("CREATE TABLE categories (id TEXT PRIMARY KEY, name TEXT NOT NULL)", []).unwrap();
        }

        let store = SqliteStore::open(&db_path).unwrap();
        let files = store.load_files().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].open_count, 0);
        assert_eq!(files[0].category, "main");
        assert_eq!(files[0].created_at, None);
    }
}
