use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cxo_types::{ContentHash, ObjectHeader, RootHash, RootHashKey};

use crate::error::{StoreError, StoreResult};
use crate::record::{HeaderRecord, IndexStats, PathRecord, RelinkOutcome, RootHashClaim};

/// The association index shared by every backend.
///
/// Backends wrap this in a lock and decide whether to persist it; all the
/// bookkeeping rules live here.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub(crate) struct IndexState {
    #[serde(default)]
    roots: BTreeMap<RootHashKey, RootHash>,
    #[serde(default)]
    headers: HashMap<ContentHash, HeaderRecord>,
    #[serde(default)]
    paths: BTreeMap<PathBuf, PathRecord>,
    #[serde(default)]
    pending: BTreeMap<RootHashKey, RootHash>,
}

impl IndexState {
    pub fn root_hash(&self, key: &RootHashKey) -> Option<RootHash> {
        self.roots.get(key).cloned()
    }

    pub fn claim_root_hash(&mut self, root: &RootHash) -> RootHashClaim {
        let key = root.key();
        if self.roots.contains_key(&key) {
            return RootHashClaim::AlreadyKnown;
        }
        if let Some(latest) = self.latest_sequence(key.publisher()) {
            if latest > key.sequence() {
                return RootHashClaim::Superseded { latest };
            }
        }
        self.roots.insert(key, root.clone());
        RootHashClaim::Claimed
    }

    pub fn release_root_hash(&mut self, key: &RootHashKey) -> bool {
        self.roots.remove(key).is_some()
    }

    pub fn latest_root_hash(&self, publisher: &str) -> Option<RootHash> {
        let lo = RootHashKey::new(0, publisher);
        let hi = RootHashKey::new(u64::MAX, publisher);
        self.roots
            .range(lo..=hi)
            .next_back()
            .map(|(_, root)| root.clone())
    }

    fn latest_sequence(&self, publisher: &str) -> Option<u64> {
        let lo = RootHashKey::new(0, publisher);
        let hi = RootHashKey::new(u64::MAX, publisher);
        self.roots
            .range(lo..=hi)
            .next_back()
            .map(|(key, _)| key.sequence())
    }

    pub fn header_record(&self, hash: &ContentHash) -> Option<HeaderRecord> {
        self.headers.get(hash).cloned()
    }

    pub fn save_header(&mut self, hash: &ContentHash, root: &RootHash, header: &ObjectHeader) {
        self.headers
            .entry(hash.clone())
            .or_insert_with(|| HeaderRecord {
                header: header.clone(),
                introduced_at: root.timestamp,
                links: BTreeSet::new(),
            })
            .links
            .insert(root.key());
    }

    pub fn save_headers(&mut self, root: &RootHash, headers: &[(ContentHash, ObjectHeader)]) {
        for (hash, header) in headers {
            self.save_header(hash, root, header);
        }
    }

    pub fn relink_header(
        &mut self,
        hash: &ContentHash,
        key: &RootHashKey,
    ) -> StoreResult<RelinkOutcome> {
        if !self.headers.contains_key(hash) {
            return Err(StoreError::HeaderNotFound(hash.clone()));
        }
        Ok(self.relink_headers(std::slice::from_ref(hash), key))
    }

    /// Walk every requested subtree once, linking what is stored. Requested
    /// or descendant hashes that are not stored land in `missing`, each once.
    pub fn relink_headers(&mut self, hashes: &[ContentHash], key: &RootHashKey) -> RelinkOutcome {
        let mut outcome = RelinkOutcome::default();
        let mut visited: HashSet<ContentHash> = HashSet::new();
        let mut stack: Vec<ContentHash> = hashes
            .iter()
            .filter(|hash| visited.insert((*hash).clone()))
            .cloned()
            .collect();
        // Pop in request order.
        stack.reverse();

        while let Some(current) = stack.pop() {
            match self.headers.get_mut(&current) {
                Some(record) => {
                    record.links.insert(key.clone());
                    outcome.relinked += 1;
                    for child in &record.header.external_references {
                        if visited.insert(child.clone()) {
                            stack.push(child.clone());
                        }
                    }
                }
                None => outcome.missing.push(current),
            }
        }

        outcome
    }

    pub fn find_new_hashes(
        &self,
        key: &RootHashKey,
        since: DateTime<Utc>,
    ) -> HashSet<ContentHash> {
        self.headers
            .iter()
            .filter(|(_, record)| record.is_linked_to(key) && record.introduced_at >= since)
            .map(|(hash, _)| hash.clone())
            .collect()
    }

    pub fn save_object_path(&mut self, path: &Path, record: PathRecord) {
        self.paths.insert(path.to_path_buf(), record);
    }

    pub fn save_object_paths(&mut self, records: Vec<(PathBuf, PathRecord)>) {
        self.paths.extend(records);
    }

    pub fn object_path(&self, path: &Path) -> Option<PathRecord> {
        self.paths.get(path).cloned()
    }

    pub fn collect_unreferenced(&mut self, key: &RootHashKey) -> Vec<PathBuf> {
        let publisher = key.publisher();
        if let Some(latest) = self.latest_sequence(publisher) {
            if latest > key.sequence() {
                tracing::debug!(%key, latest, "newer sequence known, skipping collection");
                return Vec::new();
            }
        }

        let stale: Vec<PathBuf> = self
            .paths
            .iter()
            .filter(|(_, record)| record.publisher == publisher)
            .filter(|(_, record)| {
                !self
                    .headers
                    .get(&record.header)
                    .is_some_and(|header| header.is_linked_to(key))
            })
            .map(|(path, _)| path.clone())
            .collect();

        // Anything under a removed directory goes with it on disk.
        let mut removed: BTreeSet<PathBuf> = stale.iter().cloned().collect();
        for (path, record) in &self.paths {
            if record.publisher == publisher
                && stale
                    .iter()
                    .any(|dir| path != dir && path.starts_with(dir))
            {
                removed.insert(path.clone());
            }
        }
        for path in &removed {
            self.paths.remove(path);
        }

        self.headers.retain(|_, record| {
            record
                .links
                .retain(|link| link.publisher() != publisher || link == key);
            !record.links.is_empty()
        });

        let mut removed: Vec<PathBuf> = removed.into_iter().collect();
        removed.sort_by(|a, b| {
            b.components()
                .count()
                .cmp(&a.components().count())
                .then_with(|| a.cmp(b))
        });
        removed
    }

    pub fn save_pending(&mut self, root: &RootHash) {
        self.pending.insert(root.key(), root.clone());
    }

    pub fn remove_pending(&mut self, key: &RootHashKey) -> bool {
        self.pending.remove(key).is_some()
    }

    pub fn pending(&self) -> Vec<RootHash> {
        self.pending.values().cloned().collect()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            root_hashes: self.roots.len(),
            headers: self.headers.len(),
            paths: self.paths.len(),
            pending: self.pending.len(),
        }
    }
}
