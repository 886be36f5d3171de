use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument, warn};

use crate::host::{Host, HostError, HostEvents, HostFileInfo, Result};

/// Host backed by the local filesystem and the platform opener.
#[derive(Debug, Default)]
pub struct SystemHost {
    events: HostEvents,
}

impl SystemHost {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Makes `path` absolute against the current directory and canonicalizes it
/// when possible.
pub(crate) fn to_abs_path(path: &str) -> Result<PathBuf> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(HostError::InvalidPath("path is empty".into()));
    }
    let p = Path::new(trimmed);
    let abs = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };
    let abs = abs.canonicalize().unwrap_or(abs);
    #[cfg(windows)]
    let abs = strip_verbatim_prefix(abs);
    Ok(abs)
}

#[cfg(windows)]
fn strip_verbatim_prefix(path: PathBuf) -> PathBuf {
    match path.to_str().and_then(|s| s.strip_prefix(r"\\?\")) {
        Some(stripped) => PathBuf::from(stripped),
        None => path,
    }
}

fn is_shortcut(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("lnk"))
}

/// PowerShell snippet printing a `.lnk` file's target. Single quotes are doubled.
fn shortcut_target_script(path: &Path) -> String {
    let quoted = path.to_string_lossy().replace('\'', "''");
    format!(
        "$shell = New-Object -ComObject WScript.Shell; $shortcut = $shell.CreateShortcut('{quoted}'); $shortcut.TargetPath"
    )
}

/// Follows a Windows shell shortcut to its target. Anything else, or a shortcut
/// whose target cannot be read or no longer exists, is returned unchanged.
async fn resolve_shortcut(path: PathBuf) -> PathBuf {
    if !cfg!(windows) || !is_shortcut(&path) {
        return path;
    }
    let output = tokio::process::Command::new("powershell")
        .args(["-NoProfile", "-Command", &shortcut_target_script(&path)])
        .output()
        .await;
    match output {
        Ok(out) if out.status.success() => {
            let target = PathBuf::from(String::from_utf8_lossy(&out.stdout).trim());
            if !target.as_os_str().is_empty() && fs::try_exists(&target).await.unwrap_or(false) {
                debug!("Shortcut {} points at {}", path.display(), target.display());
                return target;
            }
            path
        }
        Ok(out) => {
            warn!("Could not read shortcut {}: exit {}", path.display(), out.status);
            path
        }
        Err(e) => {
            warn!("Could not read shortcut {}: {}", path.display(), e);
            path
        }
    }
}

async fn existing(path: &str) -> Result<PathBuf> {
    let abs = to_abs_path(path)?;
    if !fs::try_exists(&abs).await? {
        return Err(HostError::NotFound(abs));
    }
    Ok(abs)
}

/// Opens without waiting for the launched program.
fn launch(target: &Path) -> Result<()> {
    open::that_detached(target).map_err(|e| HostError::Launch(format!("{}: {}", target.display(), e)))
}

#[async_trait]
impl Host for SystemHost {
    #[instrument(skip(self))]
    async fn file_info(&self, path: &str) -> Result<HostFileInfo> {
        let abs = resolve_shortcut(existing(path).await?).await;
        let metadata = fs::metadata(&abs).await?;
        let name = abs
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| HostError::InvalidPath(abs.display().to_string()))?;
        let mime_type = if metadata.is_dir() {
            "inode/directory".to_string()
        } else {
            mime_guess::from_path(&abs).first_or_octet_stream().essence_str().to_string()
        };
        debug!("Resolved {} ({} bytes, {})", abs.display(), metadata.len(), mime_type);

        Ok(HostFileInfo {
            id: None,
            name,
            display_name: None,
            path: abs.to_string_lossy().to_string(),
            size: metadata.len(),
            mime_type,
            icon: None,
            created_at: None,
        })
    }

    #[instrument(skip(self))]
    async fn open_path(&self, path: &str) -> Result<()> {
        let abs = existing(path).await?;
        launch(&abs)
    }

    #[instrument(skip(self))]
    async fn reveal_path(&self, path: &str) -> Result<()> {
        let abs = existing(path).await?;
        let folder = if abs.is_dir() {
            abs.as_path()
        } else {
            abs.parent().unwrap_or(abs.as_path())
        };
        launch(folder)
    }

    fn events(&self) -> &HostEvents {
        &self.events
    }
}

/// Opens a path with the platform default, for when no host is configured.
pub(crate) fn open_detached(path: &str) -> Result<()> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(HostError::InvalidPath("path is empty".into()));
    }
    launch(Path::new(trimmed))
}
