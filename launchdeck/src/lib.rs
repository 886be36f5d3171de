use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use launchdeck_core::config::{self, BackendKind, LauncherConfig};
use launchdeck_core::{Registry, SystemHost};
use tracing::debug;

pub mod cli;
pub mod commands;

/// Everything a command handler needs, opened once per invocation.
pub struct AppContext {
    pub data_dir: PathBuf,
    pub config: LauncherConfig,
    pub host: Arc<SystemHost>,
    pub registry: Registry,
}

impl AppContext {
    /// Loads the configuration from `data_dir` (or the platform default), opens the
    /// selected backend and loads the registry.
    pub async fn open(
        data_dir: Option<PathBuf>,
        backend: Option<BackendKind>,
        category: Option<&str>,
    ) -> anyhow::Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => config::default_data_dir()?,
        };
        let mut config = LauncherConfig::load(&data_dir)
            .await
            .with_context(|| format!("Failed to load configuration from {}", data_dir.display()))?;
        if let Some(backend) = backend {
            config.backend = backend;
        }
        debug!("Using {:?} backend in {}", config.backend, data_dir.display());

        let persistence = config.open_persistence(&data_dir).await?;
        let host = Arc::new(SystemHost::new());
        let mut registry =
            Registry::with_default_category(persistence, Some(host.clone()), &config.default_category);
        registry.load().await;
        if let Some(category) = category {
            registry.switch_active(category)?;
        }

        Ok(AppContext { data_dir, config, host, registry })
    }
}
