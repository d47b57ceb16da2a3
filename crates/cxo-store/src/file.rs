use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use cxo_types::{ContentHash, ObjectHeader, RootHash, RootHashKey};

use crate::error::{StoreError, StoreResult};
use crate::index::IndexState;
use crate::record::{HeaderRecord, IndexStats, PathRecord, RelinkOutcome, RootHashClaim};
use crate::traits::NodeStore;

/// Node store persisted as a JSON snapshot.
///
/// Mutations are serialized by a writer lock. Each one is applied to a copy
/// of the committed index, written to a temporary file next to the snapshot,
/// synced, and renamed into place; only then is the copy swapped in. The
/// state lock is held for the swap alone, so readers keep answering from
/// the committed index while a snapshot is on its way to disk. A failed
/// write leaves both the file and the in-memory index at the previous state.
pub struct FileNodeStore {
    path: PathBuf,
    state: RwLock<IndexState>,
    writer: Mutex<()>,
}

impl FileNodeStore {
    /// Open the snapshot at `path`, starting empty if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let state = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => IndexState::default(),
            Err(e) => return Err(e.into()),
        };

        let store = Self {
            path,
            state: RwLock::new(state),
            writer: Mutex::new(()),
        };
        let stats = store.stats()?;
        tracing::info!(
            path = %store.path.display(),
            root_hashes = stats.root_hashes,
            headers = stats.headers,
            paths = stats.paths,
            pending = stats.pending,
            "opened node index"
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read<T>(&self, f: impl FnOnce(&IndexState) -> T) -> StoreResult<T> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(f(&state))
    }

    fn update<T>(&self, f: impl FnOnce(&mut IndexState) -> StoreResult<T>) -> StoreResult<T> {
        let _writer = self.writer.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut next = self.read(IndexState::clone)?;
        let out = f(&mut next)?;
        self.persist(&next)?;
        *self.state.write().map_err(|_| StoreError::LockPoisoned)? = next;
        Ok(out)
    }

    fn persist(&self, state: &IndexState) -> StoreResult<()> {
        let bytes =
            serde_json::to_vec(state).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        tracing::trace!(path = %self.path.display(), bytes = bytes.len(), "index snapshot written");
        Ok(())
    }
}

impl NodeStore for FileNodeStore {
    fn get_root_hash(&self, key: &RootHashKey) -> StoreResult<Option<RootHash>> {
        self.read(|s| s.root_hash(key))
    }

    fn save_root_hash(&self, root: &RootHash) -> StoreResult<RootHashClaim> {
        // Lost claims change nothing, so skip the write.
        if self.read(|s| s.root_hash(&root.key()).is_some())? {
            return Ok(RootHashClaim::AlreadyKnown);
        }
        self.update(|s| Ok(s.claim_root_hash(root)))
    }

    fn release_root_hash(&self, key: &RootHashKey) -> StoreResult<bool> {
        self.update(|s| Ok(s.release_root_hash(key)))
    }

    fn latest_root_hash(&self, publisher: &str) -> StoreResult<Option<RootHash>> {
        self.read(|s| s.latest_root_hash(publisher))
    }

    fn get_header_record(&self, hash: &ContentHash) -> StoreResult<Option<HeaderRecord>> {
        self.read(|s| s.header_record(hash))
    }

    fn save_header(
        &self,
        hash: &ContentHash,
        root: &RootHash,
        header: &ObjectHeader,
    ) -> StoreResult<()> {
        self.update(|s| {
            s.save_header(hash, root, header);
            Ok(())
        })
    }

    fn save_headers(
        &self,
        root: &RootHash,
        headers: &[(ContentHash, ObjectHeader)],
    ) -> StoreResult<()> {
        if headers.is_empty() {
            return Ok(());
        }
        self.update(|s| {
            s.save_headers(root, headers);
            Ok(())
        })
    }

    fn relink_header(&self, hash: &ContentHash, key: &RootHashKey) -> StoreResult<RelinkOutcome> {
        self.update(|s| s.relink_header(hash, key))
    }

    fn relink_headers(
        &self,
        hashes: &[ContentHash],
        key: &RootHashKey,
    ) -> StoreResult<RelinkOutcome> {
        if hashes.is_empty() {
            return Ok(RelinkOutcome::default());
        }
        self.update(|s| Ok(s.relink_headers(hashes, key)))
    }

    fn find_new_hashes(
        &self,
        key: &RootHashKey,
        since: DateTime<Utc>,
    ) -> StoreResult<HashSet<ContentHash>> {
        self.read(|s| s.find_new_hashes(key, since))
    }

    fn save_object_path(&self, path: &Path, record: PathRecord) -> StoreResult<()> {
        self.update(|s| {
            s.save_object_path(path, record);
            Ok(())
        })
    }

    fn save_object_paths(&self, records: Vec<(PathBuf, PathRecord)>) -> StoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.update(|s| {
            s.save_object_paths(records);
            Ok(())
        })
    }

    fn get_object_path(&self, path: &Path) -> StoreResult<Option<PathRecord>> {
        self.read(|s| s.object_path(path))
    }

    fn collect_unreferenced(&self, key: &RootHashKey) -> StoreResult<Vec<PathBuf>> {
        self.update(|s| Ok(s.collect_unreferenced(key)))
    }

    fn save_pending(&self, root: &RootHash) -> StoreResult<()> {
        self.update(|s| {
            s.save_pending(root);
            Ok(())
        })
    }

    fn remove_pending(&self, key: &RootHashKey) -> StoreResult<bool> {
        self.update(|s| Ok(s.remove_pending(key)))
    }

    fn pending(&self) -> StoreResult<Vec<RootHash>> {
        self.read(|s| s.pending())
    }

    fn stats(&self) -> StoreResult<IndexStats> {
        self.read(|s| s.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn h(s: &str) -> ContentHash {
        ContentHash::new(s).unwrap()
    }

    fn root(sequence: u64) -> RootHash {
        RootHash::new(
            "pub1",
            sequence,
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            h("H0"),
        )
    }

    #[test]
    fn reopen_restores_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        {
            let store = FileNodeStore::open(&path).unwrap();
            assert_eq!(store.save_root_hash(&root(1)).unwrap(), RootHashClaim::Claimed);
            store
                .save_header(&h("H0"), &root(1), &ObjectHeader::directory("root", vec![]))
                .unwrap();
            store
                .save_object_path(
                    &dir.path().join("pub1/root"),
                    PathRecord::directory(h("H0"), "pub1"),
                )
                .unwrap();
            store.save_pending(&root(2)).unwrap();
        }

        let store = FileNodeStore::open(&path).unwrap();
        assert_eq!(store.save_root_hash(&root(1)).unwrap(), RootHashClaim::AlreadyKnown);
        assert!(store.get_header(&h("H0")).unwrap().is_some());
        assert!(store
            .get_object_path(&dir.path().join("pub1/root"))
            .unwrap()
            .is_some());
        assert_eq!(store.pending().unwrap(), vec![root(2)]);
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/state/index.json");
        let store = FileNodeStore::open(&path).unwrap();
        store.save_pending(&root(1)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn corrupt_snapshot_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(matches!(
            FileNodeStore::open(&path),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn batches_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        let base = dir.path().join("pub1/root");

        {
            let store = FileNodeStore::open(&path).unwrap();
            store
                .save_headers(
                    &root(1),
                    &[
                        (h("H0"), ObjectHeader::directory("root", vec![h("H1")])),
                        (h("H1"), ObjectHeader::file("a.txt", h("O1"))),
                    ],
                )
                .unwrap();
            store
                .save_object_paths(vec![
                    (base.clone(), PathRecord::directory(h("H0"), "pub1").mark_incomplete()),
                    (base.join("a.txt"), PathRecord::file(h("O1"), h("H1"), "pub1")),
                ])
                .unwrap();
            let outcome = store
                .relink_headers(&[h("H0"), h("H9")], &RootHashKey::new(2, "pub1"))
                .unwrap();
            assert_eq!(outcome.relinked, 2);
            assert_eq!(outcome.missing, vec![h("H9")]);
        }

        let store = FileNodeStore::open(&path).unwrap();
        let record = store.get_header_record(&h("H1")).unwrap().unwrap();
        assert!(record.is_linked_to(&RootHashKey::new(2, "pub1")));
        assert!(store.get_object_path(&base).unwrap().unwrap().incomplete);
        assert_eq!(store.stats().unwrap().paths, 2);
    }

    #[test]
    fn reads_do_not_wait_for_writers() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileNodeStore::open(dir.path().join("index.json")).unwrap();
        store
            .save_header(&h("H0"), &root(1), &ObjectHeader::directory("root", vec![]))
            .unwrap();
        store.save_root_hash(&root(1)).unwrap();

        // A writer in the middle of persisting holds only the writer lock.
        let _writer = store.writer.lock().unwrap();
        assert!(store.get_header(&h("H0")).unwrap().is_some());
        assert_eq!(store.stats().unwrap().headers, 1);
        assert_eq!(store.save_root_hash(&root(1)).unwrap(), RootHashClaim::AlreadyKnown);
    }

    #[test]
    fn failed_relink_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileNodeStore::open(dir.path().join("index.json")).unwrap();
        assert!(store
            .relink_header(&h("missing"), &RootHashKey::new(1, "pub1"))
            .is_err());
        assert_eq!(store.stats().unwrap(), IndexStats::default());
    }
}
