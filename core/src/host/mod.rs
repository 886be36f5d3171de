//! The native shell the launcher runs in.
//!
//! A [`Host`] looks up file information, opens paths and pushes drag-drop events.
//! [`SystemHost`] implements it on top of the local filesystem and the platform's
//! default opener.

pub use self::system::SystemHost;
pub(crate) use self::system::open_detached;

mod system;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::event::{define_event_listeners, Event};

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Path does not exist: {0}")]
    NotFound(PathBuf),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Failed to launch: {0}")]
    Launch(String),
}

pub type Result<T> = std::result::Result<T, HostError>;

/// What the host knows about a file.
///
/// Optional fields are filled in by the ingestion pipeline when missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostFileInfo {
    /// Ignored by ingestion, which always assigns a fresh id.
    pub id: Option<String>,
    pub name: String,
    pub display_name: Option<String>,
    /// Resolved path, e.g. absolutized.
    pub path: String,
    pub size: u64,
    pub mime_type: String,
    pub icon: Option<String>,
    pub created_at: Option<i64>,
}

#[async_trait]
pub trait Host: Send + Sync {
    async fn file_info(&self, path: &str) -> Result<HostFileInfo>;

    async fn open_path(&self, path: &str) -> Result<()>;

    /// Opens the folder containing `path`.
    async fn reveal_path(&self, path: &str) -> Result<()>;

    fn events(&self) -> &HostEvents;
}

/// Paths were dropped onto the launcher window.
#[derive(Debug, Clone)]
pub struct FilesDropped {
    pub paths: Vec<String>,
}

impl Event for FilesDropped {}

define_event_listeners! {
    /// Events pushed by a [`Host`].
    HostEvents {
        files_dropped: FilesDropped,
    }
}

impl HostEvents {
    /// Delivers a drag-drop event to every subscriber.
    pub fn drop_paths(&self, paths: Vec<String>) {
        if paths.is_empty() {
            return;
        }
        self.files_dropped.dispatch(&FilesDropped { paths });
    }
}
