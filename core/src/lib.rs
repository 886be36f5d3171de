//! File and category registry for the launchdeck desktop launcher.
//!
//! The [`Registry`] keeps user-chosen files grouped into categories, normalizes what
//! the [`Host`] reports about them and saves every change through [`Persistence`],
//! which writes a structured store when one is available and a flat key-value store
//! otherwise.

pub mod config;
pub mod event;
pub mod host;
pub mod icon;
pub mod launcher;
pub mod model;
pub mod naming;
pub mod registry;
pub mod storage;
pub mod subscription;

pub use config::{BackendKind, LauncherConfig};
pub use host::{Host, HostFileInfo, SystemHost};
pub use launcher::Launcher;
pub use model::{Category, FileRecord};
pub use registry::{IngestReport, RawItem, Registry};
pub use storage::Persistence;
