//! Launcher configuration, stored as `config.json` in the data directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

use crate::model::DEFAULT_CATEGORY_ID;
use crate::storage::{self, JsonFileStore, Persistence, SqliteStore};

pub const CONFIG_FILENAME: &str = "config.json";
const APP_DIR_NAME: &str = "launchdeck";

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Configuration file is malformed: {0}")]
    Invalid(PathBuf),

    #[error("Could not determine a data directory")]
    NoDataDir,

    #[error("Failed to open storage")]
    Storage(#[from] storage::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Which persistence backend the registry writes to first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQLite database with the flat store as fallback.
    #[default]
    Sqlite,
    /// Flat JSON slots only.
    Flat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub backend: BackendKind,
    pub database_file: String,
    pub store_dir: String,
    pub default_category: String,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        LauncherConfig {
            backend: BackendKind::default(),
            database_file: "launchdeck.db".to_string(),
            store_dir: "store".to_string(),
            default_category: DEFAULT_CATEGORY_ID.to_string(),
        }
    }
}

impl LauncherConfig {
    /// Reads `config.json` from `data_dir`, falling back to defaults when the file
    /// does not exist.
    pub async fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILENAME);
        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::Io(e)),
        };
        serde_json::from_slice(&content).map_err(|e| {
            warn!("Failed to parse config file '{}': {}", path.display(), e);
            Error::Invalid(path)
        })
    }

    pub async fn save(&self, data_dir: &Path) -> Result<()> {
        fs::create_dir_all(data_dir).await?;
        let path = data_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self)
            .map_err(|_| Error::Invalid(path.clone()))?;
        fs::write(&path, content).await?;
        debug!("Config written to {}", path.display());
        Ok(())
    }

    /// Builds the persistence adapter this configuration selects.
    pub async fn open_persistence(&self, data_dir: &Path) -> Result<Persistence> {
        let flat = Arc::new(JsonFileStore::open(data_dir.join(&self.store_dir)).await?);
        match self.backend {
            BackendKind::Flat => Ok(Persistence::flat(flat)),
            BackendKind::Sqlite => {
                let db_path = data_dir.join(&self.database_file);
                match SqliteStore::open(&db_path) {
                    Ok(sqlite) => Ok(Persistence::structured(Arc::new(sqlite), flat)),
                    Err(e) => {
                        warn!("Cannot open database '{}', using flat store only: {}", db_path.display(), e);
                        Ok(Persistence::flat(flat))
                    }
                }
            }
        }
    }
}

/// Platform data directory for the launcher, e.g. `~/.local/share/launchdeck`.
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or(Error::NoDataDir)
}
