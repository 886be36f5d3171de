use std::path::Path;

use tracing::{debug, warn};

use crate::host::{Host, HostFileInfo};
use crate::icon;
use crate::model::{new_file_id, now_millis, FileRecord};
use crate::naming;

/// A file as handed over by a picker or a drop, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub name: String,
    pub path: Option<String>,
    /// Path relative to a picked directory, used when `path` is absent.
    pub relative_path: Option<String>,
    pub size: u64,
    pub mime_type: Option<String>,
}

impl RawItem {
    /// An item known only by its path, as delivered by drag-drop.
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = Path::new(&path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.clone());
        RawItem { name, path: Some(path), ..Default::default() }
    }

    /// The path the record will be filed under: `path`, else `relative_path`,
    /// else the bare name.
    pub fn resolved_path(&self) -> &str {
        [self.path.as_deref(), self.relative_path.as_deref()]
            .into_iter()
            .flatten()
            .find(|p| !p.trim().is_empty())
            .unwrap_or(self.name.as_str())
    }
}

/// Counts of one ingestion batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub accepted: usize,
    pub skipped: usize,
}

impl std::ops::AddAssign for IngestReport {
    fn add_assign(&mut self, other: Self) {
        self.accepted += other.accepted;
        self.skipped += other.skipped;
    }
}

/// Turns raw items into normalized file records.
pub struct IngestionPipeline<'a> {
    host: Option<&'a dyn Host>,
}

impl<'a> IngestionPipeline<'a> {
    pub fn new(host: Option<&'a dyn Host>) -> Self {
        IngestionPipeline { host }
    }

    /// Builds the record for `item`, stamped with `category`.
    ///
    /// The host's lookup is preferred; when it fails the record is made from the
    /// item's own fields. Either way the id is fresh.
    pub async fn build(&self, item: &RawItem, category: &str) -> FileRecord {
        let info = match self.lookup(item).await {
            Some(info) => info,
            None => fallback_info(item),
        };
        normalize(info, category)
    }

    async fn lookup(&self, item: &RawItem) -> Option<HostFileInfo> {
        let host = self.host?;
        let key = item.resolved_path();
        if key.trim().is_empty() {
            return None;
        }
        match host.file_info(key).await {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("File lookup failed for {}, using raw fields: {}", key, e);
                None
            }
        }
    }
}

fn fallback_info(item: &RawItem) -> HostFileInfo {
    let path = item.resolved_path().to_string();
    let name = if item.name.is_empty() {
        RawItem::from_path(path.clone()).name
    } else {
        item.name.clone()
    };
    let mime_type = item
        .mime_type
        .clone()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| guess_mime(&name).to_string());
    HostFileInfo {
        id: None,
        name,
        display_name: None,
        path,
        size: item.size,
        mime_type,
        icon: None,
        created_at: None,
    }
}

fn guess_mime(name: &str) -> mime::Mime {
    mime_guess::from_path(name).first().unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

fn normalize(info: HostFileInfo, category: &str) -> FileRecord {
    let icon = info
        .icon
        .filter(|i| !i.is_empty())
        .unwrap_or_else(|| icon::icon_for(&info.name).to_string());
    let display_name = info
        .display_name
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| naming::display_name(&info.name));
    let record = FileRecord {
        id: new_file_id(),
        display_name,
        path: info.path,
        size: info.size,
        mime_type: info.mime_type,
        icon,
        category: category.to_string(),
        open_count: 0,
        created_at: Some(info.created_at.unwrap_or_else(now_millis)),
        name: info.name,
    };
    debug!("Normalized {} as {}", record.path, record.id);
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostError, HostEvents, Result};
    use async_trait::async_trait;

    struct FixedHost {
        events: HostEvents,
        info: Option<HostFileInfo>,
    }

    #[async_trait]
    impl Host for FixedHost {
        async fn file_info(&self, path: &str) -> Result<HostFileInfo> {
            self.info.clone().ok_or_else(|| HostError::NotFound(path.into()))
        }
        async fn open_path(&self, _: &str) -> Result<()> {
            Ok(())
        }
        async fn reveal_path(&self, _: &str) -> Result<()> {
            Ok(())
        }
        fn events(&self) -> &HostEvents {
            &self.events
        }
    }

    #[tokio::test]
    async fn test_without_host_uses_raw_fields() {
        let item = RawItem {
            name: "report.pdf".into(),
            path: Some("/a/report.pdf".into()),
            size: 12,
            ..Default::default()
        };
        let record = IngestionPipeline::new(None).build(&item, "main").await;
        assert_eq!(record.icon, "📄");
        assert_eq!(record.display_name, "report");
        assert_eq!(record.open_count, 0);
        assert_eq!(record.category, "main");
        assert_eq!(record.mime_type, "application/pdf");
        assert_eq!(record.size, 12);
        assert!(record.created_at.is_some());
    }

    #[tokio::test]
    async fn test_host_values_win_but_id_is_fresh() {
        let host = FixedHost {
            events: HostEvents::new(),
            info: Some(HostFileInfo {
                id: Some("host-id".into()),
                name: "tool.exe".into(),
                display_name: Some("My Tool".into()),
                path: "/opt/tool.exe".into(),
                size: 99,
                mime_type: "application/x-msdownload".into(),
                icon: Some("data:image/png;base64,AAAA".into()),
                created_at: Some(5),
            }),
        };
        let record = IngestionPipeline::new(Some(&host)).build(&RawItem::from_path("tool.exe"), "apps").await;
        assert_ne!(record.id, "host-id");
        assert_eq!(record.display_name, "My Tool");
        assert_eq!(record.icon, "data:image/png;base64,AAAA");
        assert_eq!(record.path, "/opt/tool.exe");
        assert_eq!(record.created_at, Some(5));
    }

    #[tokio::test]
    async fn test_empty_host_icon_is_resolved_locally() {
        let host = FixedHost {
            events: HostEvents::new(),
            info: Some(HostFileInfo {
                name: "main.rs".into(),
                path: "/src/main.rs".into(),
                icon: Some(String::new()),
                ..Default::default()
            }),
        };
        let record = IngestionPipeline::new(Some(&host)).build(&RawItem::from_path("/src/main.rs"), "main").await;
        assert_eq!(record.icon, "🦀");
        assert_eq!(record.display_name, "main");
    }

    #[tokio::test]
    async fn test_failed_lookup_falls_back() {
        let host = FixedHost { events: HostEvents::new(), info: None };
        let record = IngestionPipeline::new(Some(&host)).build(&RawItem::from_path("/gone/notes.md"), "main").await;
        assert_eq!(record.name, "notes.md");
        assert_eq!(record.path, "/gone/notes.md");
        assert_eq!(record.icon, "📝");
    }

    #[test]
    fn test_resolved_path_order() {
        let mut item = RawItem { name: "a.txt".into(), ..Default::default() };
        assert_eq!(item.resolved_path(), "a.txt");
        item.relative_path = Some("dir/a.txt".into());
        assert_eq!(item.resolved_path(), "dir/a.txt");
        item.path = Some("/abs/a.txt".into());
        assert_eq!(item.resolved_path(), "/abs/a.txt");
    }
}
