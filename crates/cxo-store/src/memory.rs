use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use cxo_types::{ContentHash, ObjectHeader, RootHash, RootHashKey};

use crate::error::{StoreError, StoreResult};
use crate::index::IndexState;
use crate::record::{HeaderRecord, IndexStats, PathRecord, RelinkOutcome, RootHashClaim};
use crate::traits::NodeStore;

/// In-memory node store.
///
/// Intended for tests and embedding. The whole index sits behind one
/// `RwLock`; every trait method takes it exactly once.
pub struct InMemoryNodeStore {
    state: RwLock<IndexState>,
}

impl InMemoryNodeStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(IndexState::default()),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&IndexState) -> T) -> StoreResult<T> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(f(&state))
    }

    fn update<T>(&self, f: impl FnOnce(&mut IndexState) -> T) -> StoreResult<T> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(f(&mut state))
    }
}

impl Default for InMemoryNodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore for InMemoryNodeStore {
    fn get_root_hash(&self, key: &RootHashKey) -> StoreResult<Option<RootHash>> {
        self.read(|s| s.root_hash(key))
    }

    fn save_root_hash(&self, root: &RootHash) -> StoreResult<RootHashClaim> {
        self.update(|s| s.claim_root_hash(root))
    }

    fn release_root_hash(&self, key: &RootHashKey) -> StoreResult<bool> {
        self.update(|s| s.release_root_hash(key))
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
        self.update(|s| s.save_header(hash, root, header))
    }

    fn save_headers(
        &self,
        root: &RootHash,
        headers: &[(ContentHash, ObjectHeader)],
    ) -> StoreResult<()> {
        self.update(|s| s.save_headers(root, headers))
    }

    fn relink_header(&self, hash: &ContentHash, key: &RootHashKey) -> StoreResult<RelinkOutcome> {
        self.update(|s| s.relink_header(hash, key))?
    }

    fn relink_headers(
        &self,
        hashes: &[ContentHash],
        key: &RootHashKey,
    ) -> StoreResult<RelinkOutcome> {
        self.update(|s| s.relink_headers(hashes, key))
    }

    fn find_new_hashes(
        &self,
        key: &RootHashKey,
        since: DateTime<Utc>,
    ) -> StoreResult<HashSet<ContentHash>> {
        self.read(|s| s.find_new_hashes(key, since))
    }

    fn save_object_path(&self, path: &Path, record: PathRecord) -> StoreResult<()> {
        self.update(|s| s.save_object_path(path, record))
    }

    fn save_object_paths(&self, records: Vec<(PathBuf, PathRecord)>) -> StoreResult<()> {
        self.update(|s| s.save_object_paths(records))
    }

    fn get_object_path(&self, path: &Path) -> StoreResult<Option<PathRecord>> {
        self.read(|s| s.object_path(path))
    }

    fn collect_unreferenced(&self, key: &RootHashKey) -> StoreResult<Vec<PathBuf>> {
        self.update(|s| s.collect_unreferenced(key))
    }

    fn save_pending(&self, root: &RootHash) -> StoreResult<()> {
        self.update(|s| s.save_pending(root))
    }

    fn remove_pending(&self, key: &RootHashKey) -> StoreResult<bool> {
        self.update(|s| s.remove_pending(key))
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
    use std::sync::Arc;

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
    fn empty_store_lookups() {
        let store = InMemoryNodeStore::new();
        assert!(store.get_root_hash(&RootHashKey::new(1, "pub1")).unwrap().is_none());
        assert!(store.get_header(&h("H0")).unwrap().is_none());
        assert!(store.get_object_path(Path::new("/x")).unwrap().is_none());
        assert_eq!(store.stats().unwrap(), IndexStats::default());
    }

    #[test]
    fn header_via_trait_default() {
        let store = InMemoryNodeStore::new();
        let header = ObjectHeader::file("a.txt", h("O1"));
        store.save_header(&h("H1"), &root(1), &header).unwrap();
        assert_eq!(store.get_header(&h("H1")).unwrap(), Some(header));
    }

    #[test]
    fn concurrent_claims_yield_one_winner() {
        let store = Arc::new(InMemoryNodeStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.save_root_hash(&root(1)).unwrap())
            })
            .collect();
        let claims: Vec<RootHashClaim> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = claims
            .iter()
            .filter(|c| **c == RootHashClaim::Claimed)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(store.stats().unwrap().root_hashes, 1);
    }

    #[test]
    fn relink_missing_root_is_error() {
        let store = InMemoryNodeStore::new();
        assert!(matches!(
            store.relink_header(&h("H9"), &RootHashKey::new(1, "pub1")),
            Err(StoreError::HeaderNotFound(_))
        ));
    }

    #[test]
    fn usable_as_trait_object() {
        let store: Arc<dyn NodeStore> = Arc::new(InMemoryNodeStore::default());
        store.save_pending(&root(1)).unwrap();
        assert_eq!(store.pending().unwrap().len(), 1);
        assert!(store.remove_pending(&root(1).key()).unwrap());
    }
}
