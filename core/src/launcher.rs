use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::host::{FilesDropped, Host};
use crate::registry::Registry;
use crate::storage::{KeyValueStore, StoreChanged};
use crate::subscription::Subscription;

/// A registry shared with the background tasks that feed it.
///
/// [`Launcher::watch_drops`] ingests paths dropped onto the host window and
/// [`Launcher::watch_store`] reloads slots written by other instances sharing the
/// same flat store.
pub struct Launcher {
    registry: Arc<Mutex<Registry>>,
    host: Option<Arc<dyn Host>>,
    flat: Arc<dyn KeyValueStore>,
    origin: Uuid,
    drops: Option<Subscription<FilesDropped>>,
    store: Option<Subscription<StoreChanged>>,
}

impl Launcher {
    pub fn new(registry: Registry) -> Self {
        let host = registry.host().cloned();
        let flat = registry.persistence().flat_store().clone();
        let origin = registry.origin();
        Launcher {
            registry: Arc::new(Mutex::new(registry)),
            host,
            flat,
            origin,
            drops: None,
            store: None,
        }
    }

    pub fn registry(&self) -> &Arc<Mutex<Registry>> {
        &self.registry
    }

    /// Starts ingesting drag-drop events into the active category.
    /// Returns `false` when there is no host to listen to.
    pub fn watch_drops(&mut self) -> bool {
        let Some(host) = &self.host else {
            return false;
        };
        if self.drops.is_some() {
            return true;
        }
        let registry = self.registry.clone();
        self.drops = Some(Subscription::spawn(
            &host.events().files_dropped,
            |event: &FilesDropped| Some(event.paths.clone()),
            move |paths: Vec<String>| {
                let registry = registry.clone();
                async move {
                    debug!("{} paths dropped", paths.len());
                    registry.lock().await.ingest_dropped(paths).await;
                }
            },
        ));
        true
    }

    /// Starts reloading flat-store slots written by other instances.
    pub fn watch_store(&mut self) {
        if self.store.is_some() {
            return;
        }
        let origin = self.origin;
        let registry = self.registry.clone();
        self.store = Some(Subscription::spawn(
            &self.flat.events().changed,
            move |event: &StoreChanged| (event.origin != origin).then(|| event.key.clone()),
            move |key: String| {
                let registry = registry.clone();
                async move {
                    info!("Slot {} changed elsewhere, reloading", key);
                    registry.lock().await.reload_slot(&key).await;
                }
            },
        ));
    }

    /// Stops both watchers after handling what they already received.
    pub async fn shutdown(&mut self) {
        if let Some(drops) = self.drops.take() {
            drops.finish().await;
        }
        if let Some(store) = self.store.take() {
            store.finish().await;
        }
    }
}
