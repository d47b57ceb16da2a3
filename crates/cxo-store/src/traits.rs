use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use cxo_types::{ContentHash, ObjectHeader, RootHash, RootHashKey};

use crate::error::StoreResult;
use crate::record::{HeaderRecord, IndexStats, PathRecord, RelinkOutcome, RootHashClaim};

/// Storage facade used by the sync pipeline.
///
/// Methods are synchronous and may block on disk; async callers run writes
/// on the blocking pool.
///
/// All implementations must satisfy these invariants:
/// - A header is stored once per hash; later saves only add links.
/// - `save_root_hash` is the idempotency gate: exactly one caller per key
///   ever observes [`RootHashClaim::Claimed`].
/// - Each method is applied atomically, so no caller sees a half-applied
///   claim, relink, batch, or collection.
/// - Lookups of absent keys return `Ok(None)`.
pub trait NodeStore: Send + Sync {
    /// Look up a root-hash record by key.
    fn get_root_hash(&self, key: &RootHashKey) -> StoreResult<Option<RootHash>>;

    /// Atomically check for and record a root-hash.
    ///
    /// Returns [`RootHashClaim::Superseded`] without storing anything when a
    /// higher sequence is already known for the publisher.
    fn save_root_hash(&self, root: &RootHash) -> StoreResult<RootHashClaim>;

    /// Forget a claimed root-hash so a later announcement can retry it.
    /// Returns `true` if the record existed.
    fn release_root_hash(&self, key: &RootHashKey) -> StoreResult<bool>;

    /// Highest-sequence record stored for `publisher`.
    fn latest_root_hash(&self, publisher: &str) -> StoreResult<Option<RootHash>>;

    /// Look up a stored header.
    fn get_header(&self, hash: &ContentHash) -> StoreResult<Option<ObjectHeader>> {
        Ok(self.get_header_record(hash)?.map(|record| record.header))
    }

    /// Look up a stored header along with its links and introduction time.
    fn get_header_record(&self, hash: &ContentHash) -> StoreResult<Option<HeaderRecord>>;

    /// Store a header introduced by `root` and link it to `root`'s key.
    ///
    /// If the hash is already stored this only adds the link; the first
    /// introduction time is kept.
    fn save_header(
        &self,
        hash: &ContentHash,
        root: &RootHash,
        header: &ObjectHeader,
    ) -> StoreResult<()>;

    /// [`save_header`](NodeStore::save_header) for a whole batch, applied
    /// as one operation.
    fn save_headers(
        &self,
        root: &RootHash,
        headers: &[(ContentHash, ObjectHeader)],
    ) -> StoreResult<()>;

    /// Link a stored header and every stored descendant to `key`.
    ///
    /// Descendants that are referenced but not stored are reported in
    /// [`RelinkOutcome::missing`] so the caller can fetch them.
    fn relink_header(&self, hash: &ContentHash, key: &RootHashKey) -> StoreResult<RelinkOutcome>;

    /// Relink several subtrees in one operation.
    ///
    /// Unlike [`relink_header`](NodeStore::relink_header), a requested hash
    /// that is not stored is not an error: it is reported in
    /// [`RelinkOutcome::missing`] together with absent descendants, each
    /// hash at most once.
    fn relink_headers(
        &self,
        hashes: &[ContentHash],
        key: &RootHashKey,
    ) -> StoreResult<RelinkOutcome>;

    /// Hashes linked to `key` whose introduction time is at or after `since`.
    fn find_new_hashes(
        &self,
        key: &RootHashKey,
        since: DateTime<Utc>,
    ) -> StoreResult<HashSet<ContentHash>>;

    /// Record what was materialized at `path`, replacing any previous record.
    fn save_object_path(&self, path: &Path, record: PathRecord) -> StoreResult<()>;

    /// Record several paths in one operation. Later entries for the same
    /// path win.
    fn save_object_paths(&self, records: Vec<(PathBuf, PathRecord)>) -> StoreResult<()>;

    fn get_object_path(&self, path: &Path) -> StoreResult<Option<PathRecord>>;

    /// Drop the publisher's state that `key` no longer reaches.
    ///
    /// Removes path records of `key`'s publisher whose header is not linked
    /// to `key` (plus records nested under them), drops the publisher's links
    /// from older keys, and forgets headers left with no links at all.
    /// Returns the removed paths, deepest first, for on-disk deletion.
    ///
    /// Does nothing when a newer sequence is known for the publisher.
    fn collect_unreferenced(&self, key: &RootHashKey) -> StoreResult<Vec<PathBuf>>;

    /// Persist an accepted announcement that has not yet been processed.
    fn save_pending(&self, root: &RootHash) -> StoreResult<()>;

    /// Returns `true` if a pending record existed.
    fn remove_pending(&self, key: &RootHashKey) -> StoreResult<bool>;

    /// All pending announcements, ordered by key.
    fn pending(&self) -> StoreResult<Vec<RootHash>>;

    fn stats(&self) -> StoreResult<IndexStats>;
}
