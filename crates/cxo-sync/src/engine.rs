use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use cxo_store::{NodeStore, RootHashClaim};
use cxo_tracker::TrackerClient;
use cxo_types::{RootHash, RootHashKey};

use crate::blocking::store_write;
use crate::error::{SyncError, SyncResult};
use crate::gc::GarbageCollector;
use crate::materializer::Materializer;
use crate::resolver::HeaderResolver;
use crate::types::{GcPolicy, SyncConfig, SyncOutcome, SyncReport, SyncStage};

/// Drives one announced root hash through claim, resolve, materialize and
/// collect.
///
/// Cheap to share: clone the `Arc` around it and call [`process`] from as
/// many tasks as needed. Different publishers proceed in parallel; updates
/// of one publisher run one after another, and the same key is processed at
/// most once.
///
/// [`process`]: SyncEngine::process
pub struct SyncEngine {
    store: Arc<dyn NodeStore>,
    tracker: Arc<dyn TrackerClient>,
    config: SyncConfig,
    publishers: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn NodeStore>,
        tracker: Arc<dyn TrackerClient>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            tracker,
            config,
            publishers: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn NodeStore> {
        &self.store
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub async fn process(&self, root: &RootHash) -> SyncResult<SyncOutcome> {
        root.validate()?;
        let key = root.key();

        let claimed = root.clone();
        match store_write(&self.store, SyncStage::Claim, move |store| {
            store.save_root_hash(&claimed)
        })
        .await?
        {
            RootHashClaim::Claimed => {}
            RootHashClaim::AlreadyKnown => {
                tracing::debug!(key = %key, "root hash already known");
                return Ok(SyncOutcome::AlreadyKnown);
            }
            RootHashClaim::Superseded { latest } => {
                tracing::info!(key = %key, latest, "root hash superseded, ignoring");
                return Ok(SyncOutcome::Superseded { latest });
            }
        }

        let guard = self.lock_publisher(key.publisher()).await;
        let outcome = self.process_claimed(root, &key).await;
        drop(guard);
        self.forget_idle_publisher(key.publisher());
        outcome
    }

    /// Everything after the claim, under the publisher lock.
    async fn process_claimed(&self, root: &RootHash, key: &RootHashKey) -> SyncResult<SyncOutcome> {
        tracing::info!(key = %key, header = %root.object_header_hash, "processing root hash");

        let report = match self.run(root, key).await {
            Ok(Some(report)) => report,
            Ok(None) => {
                let latest = self.latest_sequence(key)?;
                tracing::info!(key = %key, latest, "superseded before materializing");
                return Ok(SyncOutcome::Superseded { latest });
            }
            Err(e) => {
                self.release(key).await;
                return Err(e);
            }
        };

        let gc = match self.config.gc_policy {
            GcPolicy::Disabled => None,
            GcPolicy::RequireCleanMaterialize if !report.materialize.is_clean() => {
                tracing::info!(
                    key = %key,
                    failed = report.materialize.failed.len(),
                    "skipping collection after incomplete materialization"
                );
                None
            }
            GcPolicy::AfterResolution | GcPolicy::RequireCleanMaterialize => Some(
                GarbageCollector::new(&self.store, &self.config.storage_root)
                    .collect(key)
                    .await?,
            ),
        };

        let report = SyncReport { gc, ..report };
        tracing::info!(
            key = %key,
            fetched = report.resolve.fetched,
            relinked = report.resolve.relinked,
            files = report.materialize.files,
            failed = report.materialize.failed.len(),
            removed = report.gc.as_ref().map_or(0, |gc| gc.removed),
            "root hash synchronized"
        );
        Ok(SyncOutcome::Completed(report))
    }

    /// Resolve and materialize. `None` means a newer sequence for the
    /// publisher was claimed first and nothing was written.
    async fn run(&self, root: &RootHash, key: &RootHashKey) -> SyncResult<Option<SyncReport>> {
        if self.latest_sequence(key)? > key.sequence() {
            return Ok(None);
        }

        let tracker = self.tracker.as_ref();
        let resolve = HeaderResolver::new(&self.store, tracker, self.config.max_resolve_rounds)
            .resolve(root)
            .await?;

        if self.latest_sequence(key)? > key.sequence() {
            return Ok(None);
        }

        let new_set = self
            .store
            .find_new_hashes(key, root.timestamp)
            .map_err(SyncError::store(SyncStage::NewSet))?;
        tracing::debug!(key = %key, new = new_set.len(), "computed new set");

        let materialize = Materializer::new(&self.store, tracker, &self.config.storage_root)
            .materialize(root, &new_set)
            .await?;

        Ok(Some(SyncReport {
            key: key.clone(),
            resolve,
            new_hashes: new_set.len(),
            materialize,
            gc: None,
        }))
    }

    fn latest_sequence(&self, key: &RootHashKey) -> SyncResult<u64> {
        let latest = self
            .store
            .latest_root_hash(key.publisher())
            .map_err(SyncError::store(SyncStage::Materialize))?;
        Ok(latest.map_or(key.sequence(), |root| root.sequence))
    }

    async fn lock_publisher(&self, publisher: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut publishers = self.publishers.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(publishers.entry(publisher.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Drop the publisher's lock once no update holds or awaits it.
    fn forget_idle_publisher(&self, publisher: &str) {
        let mut publishers = self.publishers.lock().unwrap_or_else(PoisonError::into_inner);
        if publishers
            .get(publisher)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            publishers.remove(publisher);
        }
    }

    /// Drop the claim so a re-announcement can retry the update.
    async fn release(&self, key: &RootHashKey) {
        let released = key.clone();
        if let Err(e) = store_write(&self.store, SyncStage::Claim, move |store| {
            store.release_root_hash(&released)
        })
        .await
        {
            tracing::warn!(key = %key, error = %e, "failed to release root hash claim");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use cxo_store::InMemoryNodeStore;
    use cxo_tracker::{InMemoryTracker, TrackerResult};
    use cxo_types::{ContentHash, Object, ObjectHeader};
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tokio::sync::Notify;

    fn h(s: &str) -> ContentHash {
        ContentHash::new(s).unwrap()
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, minute, 0).unwrap()
    }

    struct Node {
        store: Arc<InMemoryNodeStore>,
        tracker: Arc<InMemoryTracker>,
        engine: SyncEngine,
        dir: tempfile::TempDir,
    }

    impl Node {
        fn new(policy: GcPolicy) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let store = Arc::new(InMemoryNodeStore::new());
            let tracker = Arc::new(InMemoryTracker::new());
            let config = SyncConfig {
                gc_policy: policy,
                ..SyncConfig::new(dir.path())
            };
            let engine = SyncEngine::new(store.clone(), tracker.clone(), config);
            Self {
                store,
                tracker,
                engine,
                dir,
            }
        }

        fn path(&self, rel: &str) -> PathBuf {
            self.dir.path().join(rel)
        }

        fn read(&self, rel: &str) -> String {
            std::fs::read_to_string(self.path(rel)).unwrap()
        }

        fn file(&self, header: &str, name: &str, body: &str) {
            let object = self.tracker.insert_object(body);
            self.tracker.insert_header(h(header), ObjectHeader::file(name, object));
        }

        fn directory(&self, header: &str, name: &str, children: &[&str]) {
            self.tracker.insert_header(
                h(header),
                ObjectHeader::directory(name, children.iter().copied().map(h).collect()),
            );
        }
    }

    fn completed(outcome: SyncOutcome) -> SyncReport {
        match outcome {
            SyncOutcome::Completed(report) => report,
            other => panic!("expected completion, got {other:?}"),
        }
    }

    fn snapshot(dir: &Path) -> Vec<(PathBuf, Option<String>)> {
        let mut out = Vec::new();
        let mut stack = vec![dir.to_path_buf()];
        while let Some(d) = stack.pop() {
            for entry in std::fs::read_dir(&d).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    out.push((path.clone(), None));
                    stack.push(path);
                } else {
                    out.push((path.clone(), Some(std::fs::read_to_string(&path).unwrap())));
                }
            }
        }
        out.sort();
        out
    }

    #[tokio::test]
    async fn reconstructs_directory() {
        let node = Node::new(GcPolicy::default());
        node.directory("H0", "root", &["H1"]);
        node.file("H1", "a.txt", "hello");

        let root = RootHash::new("pub1", 1, at(0), h("H0"));
        let report = completed(node.engine.process(&root).await.unwrap());

        assert_eq!(node.read("pub1/root/a.txt"), "hello");
        let key = RootHashKey::new(1, "pub1");
        for hash in ["H0", "H1"] {
            assert!(node.store.get_header_record(&h(hash)).unwrap().unwrap().is_linked_to(&key));
        }
        assert!(node.store.get_root_hash(&key).unwrap().is_some());
        assert_eq!(report.new_hashes, 2);
    }

    #[tokio::test]
    async fn second_announcement_is_a_no_op() {
        let node = Node::new(GcPolicy::default());
        node.directory("H0", "root", &["H1"]);
        node.file("H1", "a.txt", "hello");
        let root = RootHash::new("pub1", 1, at(0), h("H0"));

        completed(node.engine.process(&root).await.unwrap());
        let fetches = node.tracker.fetch_count();
        let before = snapshot(node.dir.path());

        assert_eq!(node.engine.process(&root).await.unwrap(), SyncOutcome::AlreadyKnown);
        assert_eq!(node.tracker.fetch_count(), fetches);
        assert_eq!(snapshot(node.dir.path()), before);
    }

    #[tokio::test]
    async fn concurrent_duplicates_run_once() {
        let node = Arc::new(Node::new(GcPolicy::default()));
        node.directory("H0", "root", &["H1"]);
        node.file("H1", "a.txt", "hello");
        let root = RootHash::new("pub1", 1, at(0), h("H0"));

        let (a, b) = tokio::join!(node.engine.process(&root), node.engine.process(&root));
        let outcomes = [a.unwrap(), b.unwrap()];
        let done = outcomes
            .iter()
            .filter(|o| matches!(o, SyncOutcome::Completed(_)))
            .count();
        assert_eq!(done, 1);
        assert_eq!(node.tracker.requested_headers().len(), 2);
    }

    #[tokio::test]
    async fn update_fetches_and_writes_only_changes() {
        let node = Node::new(GcPolicy::default());
        node.directory("H0", "root", &["H1", "H2"]);
        node.file("H1", "a.txt", "hello");
        node.directory("H2", "sub", &["H3"]);
        node.file("H3", "b.txt", "world");
        completed(
            node.engine
                .process(&RootHash::new("pub1", 1, at(0), h("H0")))
                .await
                .unwrap(),
        );

        // Version 2 edits a.txt and keeps sub unchanged.
        node.directory("H0b", "root", &["H1b", "H2"]);
        node.file("H1b", "a.txt", "hello again");
        let objects_before = node.tracker.object_requests().len();
        let report = completed(
            node.engine
                .process(&RootHash::new("pub1", 2, at(5), h("H0b")))
                .await
                .unwrap(),
        );

        assert_eq!(report.resolve.fetched, 2);
        assert_eq!(report.new_hashes, 2);
        assert_eq!(report.materialize.files, 1);
        assert_eq!(node.tracker.object_requests().len(), objects_before + 1);
        assert_eq!(node.read("pub1/root/a.txt"), "hello again");
        assert_eq!(node.read("pub1/root/sub/b.txt"), "world");
    }

    #[tokio::test]
    async fn dropped_subtree_is_collected() {
        let node = Node::new(GcPolicy::default());
        node.directory("H0", "root", &["H1", "H2"]);
        node.file("H1", "keep.txt", "shared");
        node.directory("H2", "old", &["H3"]);
        node.file("H3", "gone.txt", "bye");
        completed(
            node.engine
                .process(&RootHash::new("pub1", 1, at(0), h("H0")))
                .await
                .unwrap(),
        );
        assert!(node.path("pub1/root/old/gone.txt").exists());

        node.directory("H0b", "root", &["H1"]);
        let report = completed(
            node.engine
                .process(&RootHash::new("pub1", 2, at(5), h("H0b")))
                .await
                .unwrap(),
        );

        assert!(!node.path("pub1/root/old").exists());
        assert_eq!(node.read("pub1/root/keep.txt"), "shared");
        assert_eq!(report.gc.unwrap().removed, 2);
        for gone in ["H0", "H2", "H3"] {
            assert!(node.store.get_header(&h(gone)).unwrap().is_none());
        }
        let kept = node.store.get_header_record(&h("H1")).unwrap().unwrap();
        assert!(kept.is_linked_to(&RootHashKey::new(2, "pub1")));
        assert!(!kept.is_linked_to(&RootHashKey::new(1, "pub1")));
    }

    #[tokio::test]
    async fn renamed_parent_rematerializes_children() {
        let node = Node::new(GcPolicy::default());
        node.directory("H0", "root", &["H2"]);
        node.directory("H2", "before", &["H3"]);
        node.file("H3", "b.txt", "world");
        completed(
            node.engine
                .process(&RootHash::new("pub1", 1, at(0), h("H0")))
                .await
                .unwrap(),
        );

        node.directory("H0b", "root", &["H2b"]);
        node.directory("H2b", "after", &["H3"]);
        completed(
            node.engine
                .process(&RootHash::new("pub1", 2, at(5), h("H0b")))
                .await
                .unwrap(),
        );

        assert_eq!(node.read("pub1/root/after/b.txt"), "world");
        assert!(!node.path("pub1/root/before").exists());
    }

    #[tokio::test]
    async fn other_publishers_are_untouched() {
        let node = Node::new(GcPolicy::default());
        node.directory("H0", "root", &["H1"]);
        node.file("H1", "a.txt", "hello");
        node.directory("E", "root", &[]);
        for publisher in ["pub1", "pub2"] {
            completed(
                node.engine
                    .process(&RootHash::new(publisher, 1, at(0), h("H0")))
                    .await
                    .unwrap(),
            );
        }

        completed(
            node.engine
                .process(&RootHash::new("pub1", 2, at(5), h("E")))
                .await
                .unwrap(),
        );
        assert!(!node.path("pub1/root/a.txt").exists());
        assert_eq!(node.read("pub2/root/a.txt"), "hello");
        assert!(node.store.get_header(&h("H1")).unwrap().is_some());
    }

    #[tokio::test]
    async fn failed_leaf_keeps_siblings_and_policy_decides_gc() {
        for (policy, expect_gc) in [
            (GcPolicy::AfterResolution, true),
            (GcPolicy::RequireCleanMaterialize, false),
            (GcPolicy::Disabled, false),
        ] {
            let node = Node::new(policy);
            node.directory("H0", "root", &["H1", "H2"]);
            node.file("H1", "a.txt", "hello");
            node.file("H2", "b.txt", "world");
            let o1 = node.tracker.insert_object("hello");
            node.tracker.fail_object(o1);

            let report = completed(
                node.engine
                    .process(&RootHash::new("pub1", 1, at(0), h("H0")))
                    .await
                    .unwrap(),
            );
            assert_eq!(report.materialize.failed, vec![h("H1")]);
            assert_eq!(node.read("pub1/root/b.txt"), "world");
            assert_eq!(report.gc.is_some(), expect_gc, "{policy:?}");
        }
    }

    #[tokio::test]
    async fn failed_leaf_is_retried_by_next_version() {
        let node = Node::new(GcPolicy::default());
        node.directory("H0", "root", &["H1"]);
        node.file("H1", "a.txt", "hello");
        let o1 = node.tracker.insert_object("hello");
        node.tracker.fail_object(o1.clone());
        completed(
            node.engine
                .process(&RootHash::new("pub1", 1, at(0), h("H0")))
                .await
                .unwrap(),
        );
        assert!(!node.path("pub1/root/a.txt").exists());

        // The tracker recovers; version 2 adds a file but carries H1 over.
        let healthy = InMemoryTracker::new();
        for (hash, name, body) in [("H1", "a.txt", "hello"), ("H4", "c.txt", "new")] {
            let object = healthy.insert_object(body);
            healthy.insert_header(h(hash), ObjectHeader::file(name, object));
        }
        healthy.insert_header(
            h("H0b"),
            ObjectHeader::directory("root", vec![h("H1"), h("H4")]),
        );
        let engine = SyncEngine::new(
            node.store.clone(),
            Arc::new(healthy),
            node.engine.config().clone(),
        );
        completed(
            engine
                .process(&RootHash::new("pub1", 2, at(5), h("H0b")))
                .await
                .unwrap(),
        );
        assert_eq!(node.read("pub1/root/a.txt"), "hello");
        assert_eq!(node.read("pub1/root/c.txt"), "new");
    }

    #[tokio::test]
    async fn failed_leaf_in_unchanged_subdirectory_is_retried() {
        let node = Node::new(GcPolicy::default());
        node.directory("H0", "root", &["S"]);
        node.directory("S", "sub", &["L"]);
        node.file("L", "f.txt", "late");
        let late = node.tracker.insert_object("late");
        node.tracker.fail_object(late);
        completed(
            node.engine
                .process(&RootHash::new("pub1", 1, at(0), h("H0")))
                .await
                .unwrap(),
        );
        assert!(!node.path("pub1/root/sub/f.txt").exists());

        // Version 2 carries sub over untouched and adds a sibling.
        let healthy = InMemoryTracker::new();
        healthy.insert_object("late");
        let n = healthy.insert_object("new");
        healthy.insert_header(h("N"), ObjectHeader::file("n.txt", n));
        healthy.insert_header(
            h("H0b"),
            ObjectHeader::directory("root", vec![h("S"), h("N")]),
        );
        let engine = SyncEngine::new(
            node.store.clone(),
            Arc::new(healthy),
            node.engine.config().clone(),
        );
        let report = completed(
            engine
                .process(&RootHash::new("pub1", 2, at(5), h("H0b")))
                .await
                .unwrap(),
        );

        assert_eq!(report.new_hashes, 2);
        assert_eq!(node.read("pub1/root/n.txt"), "new");
        assert_eq!(node.read("pub1/root/sub/f.txt"), "late");
    }

    /// Holds one object back until released, freezing an update mid-write.
    struct GatedTracker {
        inner: InMemoryTracker,
        gated: ContentHash,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl TrackerClient for GatedTracker {
        async fn fetch_headers(&self, hashes: &[ContentHash]) -> TrackerResult<Vec<ObjectHeader>> {
            self.inner.fetch_headers(hashes).await
        }

        async fn fetch_object(&self, hash: &ContentHash) -> TrackerResult<Object> {
            if *hash == self.gated {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.fetch_object(hash).await
        }
    }

    /// pub1 v1 writes a.txt = "one" (gated), v2 writes a.txt = "two";
    /// pub2 has its own tree.
    fn gated_setup(dir: &Path) -> (Arc<GatedTracker>, Arc<SyncEngine>) {
        let inner = InMemoryTracker::new();
        let one = inner.insert_object("one");
        let two = inner.insert_object("two");
        inner.insert_header(h("H0"), ObjectHeader::directory("root", vec![h("H1")]));
        inner.insert_header(h("H1"), ObjectHeader::file("a.txt", one.clone()));
        inner.insert_header(h("H0b"), ObjectHeader::directory("root", vec![h("H1b")]));
        inner.insert_header(h("H1b"), ObjectHeader::file("a.txt", two));
        inner.insert_header(h("P0"), ObjectHeader::directory("other", vec![]));
        let tracker = Arc::new(GatedTracker {
            inner,
            gated: one,
            entered: Notify::new(),
            release: Notify::new(),
        });
        let engine = Arc::new(SyncEngine::new(
            Arc::new(InMemoryNodeStore::new()),
            tracker.clone(),
            SyncConfig::new(dir),
        ));
        (tracker, engine)
    }

    fn spawn_process(
        engine: &Arc<SyncEngine>,
        root: RootHash,
    ) -> tokio::task::JoinHandle<SyncResult<SyncOutcome>> {
        let engine = Arc::clone(engine);
        tokio::spawn(async move { engine.process(&root).await })
    }

    #[tokio::test]
    async fn same_publisher_updates_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let (tracker, engine) = gated_setup(dir.path());

        let first = spawn_process(&engine, RootHash::new("pub1", 1, at(0), h("H0")));
        tracker.entered.notified().await;

        // v1 is past its superseded check and stuck writing a.txt.
        let second = spawn_process(&engine, RootHash::new("pub1", 2, at(5), h("H0b")));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!second.is_finished());

        tracker.release.notify_one();
        completed(first.await.unwrap().unwrap());
        completed(second.await.unwrap().unwrap());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("pub1/root/a.txt")).unwrap(),
            "two"
        );
        let record = engine
            .store()
            .get_object_path(&dir.path().join("pub1/root/a.txt"))
            .unwrap()
            .unwrap();
        assert_eq!(record.header, h("H1b"));
    }

    #[tokio::test]
    async fn other_publishers_proceed_while_one_waits() {
        let dir = tempfile::tempdir().unwrap();
        let (tracker, engine) = gated_setup(dir.path());

        let stuck = spawn_process(&engine, RootHash::new("pub1", 1, at(0), h("H0")));
        tracker.entered.notified().await;

        let report = completed(
            engine
                .process(&RootHash::new("pub2", 1, at(0), h("P0")))
                .await
                .unwrap(),
        );
        assert_eq!(report.materialize.directories, 1);
        assert!(!stuck.is_finished());

        tracker.release.notify_one();
        completed(stuck.await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn resolution_failure_releases_claim() {
        let node = Node::new(GcPolicy::default());
        node.directory("H0", "root", &["H1"]);
        let root = RootHash::new("pub1", 1, at(0), h("H0"));

        let err = node.engine.process(&root).await.unwrap_err();
        assert_eq!(err.stage(), SyncStage::Resolve);
        assert!(node.store.get_root_hash(&root.key()).unwrap().is_none());
        assert!(!node.path("pub1").exists());

        // Content shows up; the re-announcement completes and heals.
        node.file("H1", "a.txt", "hello");
        let report = completed(node.engine.process(&root).await.unwrap());
        assert_eq!(report.resolve.fetched, 1);
        assert_eq!(node.read("pub1/root/a.txt"), "hello");
    }

    #[tokio::test]
    async fn older_sequence_is_superseded() {
        let node = Node::new(GcPolicy::default());
        node.directory("H0", "root", &[]);
        completed(
            node.engine
                .process(&RootHash::new("pub1", 5, at(5), h("H0")))
                .await
                .unwrap(),
        );
        let outcome = node
            .engine
            .process(&RootHash::new("pub1", 3, at(3), h("H0")))
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Superseded { latest: 5 });
    }

    #[tokio::test]
    async fn deep_graph_hits_round_limit() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Arc::new(InMemoryTracker::new());
        tracker.insert_header(h("A"), ObjectHeader::directory("a", vec![h("B")]));
        tracker.insert_header(h("B"), ObjectHeader::directory("b", vec![h("C")]));
        tracker.insert_header(h("C"), ObjectHeader::directory("c", vec![]));
        let config = SyncConfig {
            max_resolve_rounds: 2,
            ..SyncConfig::new(dir.path())
        };
        let engine = SyncEngine::new(Arc::new(InMemoryNodeStore::new()), tracker, config);

        let err = engine
            .process(&RootHash::new("pub1", 1, at(0), h("A")))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::TooDeep(2)));
    }

    #[tokio::test]
    async fn unsafe_publisher_rejected() {
        let node = Node::new(GcPolicy::default());
        let err = node
            .engine
            .process(&RootHash::new("..", 1, at(0), h("H0")))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Invalid(_)));
        assert_eq!(node.tracker.fetch_count(), 0);
    }
}
