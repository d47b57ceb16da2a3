use std::collections::{HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;

use cxo_store::{NodeStore, PathRecord};
use cxo_tracker::TrackerClient;
use cxo_types::{ContentHash, ObjectHeader, RootHash};

use crate::blocking::store_write;
use crate::error::{SyncError, SyncResult};
use crate::types::{MaterializeReport, SyncStage};

/// Writes a resolved graph to disk under `<storage_root>/<publisher>`.
///
/// Only headers in the new set are written, plus any header the index has
/// no complete record of at its target path. Everything else is assumed to
/// be in place from an earlier version and is skipped along with its
/// subtree. When something below a directory fails, the directories above
/// it are recorded as incomplete so the next version walks them again.
pub struct Materializer<'a> {
    store: &'a Arc<dyn NodeStore>,
    tracker: &'a dyn TrackerClient,
    storage_root: &'a Path,
}

/// The children of one directory, written and recorded together.
struct Level {
    dir: PathBuf,
    children: Vec<ContentHash>,
    /// Directory headers from the root down to `dir`, with their paths.
    ancestors: Vec<(ContentHash, PathBuf)>,
}

impl<'a> Materializer<'a> {
    pub fn new(
        store: &'a Arc<dyn NodeStore>,
        tracker: &'a dyn TrackerClient,
        storage_root: &'a Path,
    ) -> Self {
        Self {
            store,
            tracker,
            storage_root,
        }
    }

    pub async fn materialize(
        &self,
        root: &RootHash,
        new_set: &HashSet<ContentHash>,
    ) -> SyncResult<MaterializeReport> {
        let publisher = root.publisher.as_str();
        let publisher_dir = self.storage_root.join(publisher);
        tokio::fs::create_dir_all(&publisher_dir)
            .await
            .map_err(|source| SyncError::StorageRoot {
                path: publisher_dir.clone(),
                source,
            })?;

        let mut report = MaterializeReport::default();
        let mut queue = VecDeque::from([Level {
            dir: publisher_dir,
            children: vec![root.object_header_hash.clone()],
            ancestors: Vec::new(),
        }]);

        while let Some(level) = queue.pop_front() {
            let mut records: Vec<(PathBuf, PathRecord)> = Vec::new();
            let mut incomplete = false;

            for hash in &level.children {
                if level.ancestors.iter().any(|(ancestor, _)| ancestor == hash) {
                    tracing::warn!(hash = %hash, path = %level.dir.display(), "header contains itself, skipping");
                    report.skipped += 1;
                    continue;
                }
                let header = match self.store.get_header(hash) {
                    Ok(Some(header)) => header,
                    Ok(None) => {
                        tracing::warn!(hash = %hash, "header missing from index, skipping");
                        report.skipped += 1;
                        incomplete = true;
                        continue;
                    }
                    Err(e) => return Err(SyncError::store(SyncStage::Materialize)(e)),
                };
                let name = match header.path_name() {
                    Ok(name) => name,
                    Err(e) => {
                        tracing::warn!(hash = %hash, error = %e, "unusable header name, skipping");
                        report.skipped += 1;
                        continue;
                    }
                };
                let target = level.dir.join(name);

                if !self.needs_write(hash, &target, new_set)? {
                    tracing::debug!(hash = %hash, path = %target.display(), "already in place");
                    report.skipped += 1;
                    continue;
                }

                if header.is_directory() {
                    if let Err(e) = ensure_dir(&target).await {
                        tracing::warn!(hash = %hash, path = %target.display(), error = %e, "cannot create directory");
                        report.failed.push(hash.clone());
                        incomplete = true;
                        continue;
                    }
                    records.push((target.clone(), PathRecord::directory(hash.clone(), publisher)));
                    report.directories += 1;

                    let mut ancestors = level.ancestors.clone();
                    ancestors.push((hash.clone(), target.clone()));
                    queue.push_back(Level {
                        dir: target,
                        children: header.children().to_vec(),
                        ancestors,
                    });
                } else if let Some(object_hash) = self.write_leaf(hash, &header, &target).await {
                    records.push((target, PathRecord::file(object_hash, hash.clone(), publisher)));
                    report.files += 1;
                } else {
                    report.failed.push(hash.clone());
                    incomplete = true;
                }
            }

            if incomplete {
                for (hash, path) in &level.ancestors {
                    records.push((
                        path.clone(),
                        PathRecord::directory(hash.clone(), publisher).mark_incomplete(),
                    ));
                }
            }
            self.save_records(records).await?;
        }

        tracing::debug!(
            key = %root.key(),
            directories = report.directories,
            files = report.files,
            skipped = report.skipped,
            failed = report.failed.len(),
            "materialized"
        );
        Ok(report)
    }

    fn needs_write(
        &self,
        hash: &ContentHash,
        target: &Path,
        new_set: &HashSet<ContentHash>,
    ) -> SyncResult<bool> {
        if new_set.contains(hash) {
            return Ok(true);
        }
        let recorded = self
            .store
            .get_object_path(target)
            .map_err(SyncError::store(SyncStage::Materialize))?;
        Ok(!recorded.is_some_and(|record| record.is_complete_for(hash)))
    }

    /// Fetch and write one leaf, returning the object hash it now holds.
    /// Fetch and write failures are logged and reported as `None`.
    async fn write_leaf(
        &self,
        hash: &ContentHash,
        header: &ObjectHeader,
        target: &Path,
    ) -> Option<ContentHash> {
        let Some(object_hash) = header.object_hash.clone() else {
            tracing::warn!(hash = %hash, "leaf header without object hash");
            return None;
        };

        let object = match self.tracker.fetch_object(&object_hash).await {
            Ok(object) => object,
            Err(e) => {
                tracing::warn!(hash = %hash, object = %object_hash, error = %e, "object fetch failed, skipping leaf");
                return None;
            }
        };

        if let Err(e) = write_file(target, &object.data).await {
            tracing::warn!(path = %target.display(), error = %e, "file write failed");
            return None;
        }

        tracing::debug!(path = %target.display(), bytes = object.data.len(), "wrote file");
        Some(object_hash)
    }

    async fn save_records(&self, records: Vec<(PathBuf, PathRecord)>) -> SyncResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        store_write(self.store, SyncStage::Materialize, move |store| {
            store.save_object_paths(records)
        })
        .await
    }
}

async fn ensure_dir(path: &Path) -> io::Result<()> {
    match tokio::fs::create_dir(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            if tokio::fs::metadata(path).await?.is_dir() {
                Ok(())
            } else {
                Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "a non-directory occupies the path",
                ))
            }
        }
        Err(e) => Err(e),
    }
}

/// Truncate-create, write, and sync.
async fn write_file(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(data).await?;
    file.flush().await?;
    file.sync_all().await
}
