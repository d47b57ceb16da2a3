use std::io;
use std::path::{Component, Path};
use std::sync::Arc;

use cxo_store::NodeStore;
use cxo_types::RootHashKey;

use crate::blocking::store_write;
use crate::error::SyncResult;
use crate::types::{GcReport, SyncStage};

/// Removes what a publisher's latest version no longer reaches.
///
/// The index prunes its own records in one step; on-disk deletion is best
/// effort and never fails the update.
pub struct GarbageCollector<'a> {
    store: &'a Arc<dyn NodeStore>,
    storage_root: &'a Path,
}

impl<'a> GarbageCollector<'a> {
    pub fn new(store: &'a Arc<dyn NodeStore>, storage_root: &'a Path) -> Self {
        Self {
            store,
            storage_root,
        }
    }

    pub async fn collect(&self, key: &RootHashKey) -> SyncResult<GcReport> {
        let collect_key = key.clone();
        let paths = store_write(self.store, SyncStage::Collect, move |store| {
            store.collect_unreferenced(&collect_key)
        })
        .await?;

        let mut report = GcReport::default();
        for path in paths {
            if !self.is_contained(&path) {
                tracing::warn!(path = %path.display(), "refusing to delete outside storage root");
                report.refused += 1;
                continue;
            }
            match remove_path(&path).await {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "removed");
                    report.removed += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => report.removed += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "delete failed");
                    report.failed += 1;
                }
            }
        }

        tracing::debug!(
            key = %key,
            removed = report.removed,
            failed = report.failed,
            refused = report.refused,
            "collected"
        );
        Ok(report)
    }

    fn is_contained(&self, path: &Path) -> bool {
        path != self.storage_root
            && path.starts_with(self.storage_root)
            && !path.components().any(|c| matches!(c, Component::ParentDir))
    }
}

async fn remove_path(path: &Path) -> io::Result<()> {
    let meta = tokio::fs::symlink_metadata(path).await?;
    if meta.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    }
}
