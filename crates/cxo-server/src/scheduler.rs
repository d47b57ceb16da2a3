use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use cxo_store::{NodeStore, StoreResult};
use cxo_sync::{SyncEngine, SyncOutcome};
use cxo_types::RootHash;

use crate::error::{ServerError, ServerResult};

/// Runs accepted announcements after the settle delay.
///
/// Each announcement is recorded as pending before its task starts waiting
/// and forgotten once the pipeline has run. Cancelling the scheduler stops
/// tasks that are still waiting (their pending record survives for
/// [`resume_pending`]) but lets running pipelines finish.
///
/// [`resume_pending`]: NotificationScheduler::resume_pending
#[derive(Clone)]
pub struct NotificationScheduler {
    engine: Arc<SyncEngine>,
    settle_delay: Duration,
    token: CancellationToken,
    tasks: TaskTracker,
}

impl NotificationScheduler {
    pub fn new(engine: Arc<SyncEngine>, settle_delay: Duration) -> Self {
        Self {
            engine,
            settle_delay,
            token: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    /// Persist `root` as pending and start its delayed task.
    pub async fn schedule(&self, root: RootHash) -> ServerResult<()> {
        let pending = root.clone();
        store_write(self.engine.store(), move |store| store.save_pending(&pending)).await?;
        self.spawn(root);
        Ok(())
    }

    /// Restart every announcement left pending by a previous run.
    pub fn resume_pending(&self) -> ServerResult<usize> {
        let pending = self.engine.store().pending()?;
        let count = pending.len();
        for root in pending {
            tracing::info!(key = %root.key(), "resuming pending announcement");
            self.spawn(root);
        }
        Ok(count)
    }

    /// Tasks still waiting or running.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every scheduled task, then accept new ones again.
    pub async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Cancel waiting tasks and wait for running pipelines.
    pub async fn shutdown(&self) {
        self.token.cancel();
        self.tasks.close();
        self.tasks.wait().await;
    }

    fn spawn(&self, root: RootHash) {
        let engine = Arc::clone(&self.engine);
        let token = self.token.clone();
        let delay = self.settle_delay;

        self.tasks.spawn(async move {
            let key = root.key();
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!(key = %key, "shutdown before settle delay elapsed, left pending");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            match engine.process(&root).await {
                Ok(SyncOutcome::Completed(_)) => {}
                Ok(SyncOutcome::AlreadyKnown) => {
                    tracing::debug!(key = %key, "duplicate announcement ignored");
                }
                Ok(SyncOutcome::Superseded { latest }) => {
                    tracing::info!(key = %key, latest, "stale announcement ignored");
                }
                Err(e) => {
                    tracing::error!(key = %key, stage = %e.stage(), error = %e, "update aborted");
                }
            }

            let done = key.clone();
            if let Err(e) = store_write(engine.store(), move |store| store.remove_pending(&done)).await {
                tracing::warn!(key = %key, error = %e, "failed to clear pending record");
            }
        });
    }
}

/// Run a store write on the blocking pool; a panicked write surfaces as
/// [`ServerError::Internal`].
async fn store_write<T, F>(store: &Arc<dyn NodeStore>, f: F) -> ServerResult<T>
where
    F: FnOnce(&dyn NodeStore) -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(store);
    let result = tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| ServerError::Internal(format!("store task failed: {e}")))?;
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use cxo_store::FileNodeStore;
    use cxo_sync::SyncConfig;
    use cxo_tracker::InMemoryTracker;
    use cxo_types::{ContentHash, ObjectHeader};

    fn root() -> RootHash {
        RootHash::new(
            "pub1",
            1,
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            ContentHash::new("H0").unwrap(),
        )
    }

    fn engine(dir: &std::path::Path, store: Arc<dyn NodeStore>) -> Arc<SyncEngine> {
        let tracker = Arc::new(InMemoryTracker::new());
        tracker.insert_header(
            ContentHash::new("H0").unwrap(),
            ObjectHeader::directory("root", vec![]),
        );
        Arc::new(SyncEngine::new(store, tracker, SyncConfig::new(dir.join("data"))))
    }

    #[tokio::test]
    async fn schedule_records_pending_until_done() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileNodeStore::open(dir.path().join("index.json")).unwrap());
        let scheduler = NotificationScheduler::new(engine(dir.path(), store.clone()), Duration::from_millis(20));

        scheduler.schedule(root()).await.unwrap();
        assert_eq!(store.pending().unwrap(), vec![root()]);
        assert_eq!(scheduler.in_flight(), 1);

        scheduler.drain().await;
        assert!(store.pending().unwrap().is_empty());
        assert!(store.get_root_hash(&root().key()).unwrap().is_some());
    }

    #[tokio::test]
    async fn shutdown_during_delay_keeps_pending_for_resume() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("index.json");

        {
            let store = Arc::new(FileNodeStore::open(&index).unwrap());
            let scheduler =
                NotificationScheduler::new(engine(dir.path(), store.clone()), Duration::from_secs(3600));
            scheduler.schedule(root()).await.unwrap();
            scheduler.shutdown().await;
            assert!(store.get_root_hash(&root().key()).unwrap().is_none());
        }

        let store = Arc::new(FileNodeStore::open(&index).unwrap());
        assert_eq!(store.pending().unwrap().len(), 1);
        let scheduler = NotificationScheduler::new(engine(dir.path(), store.clone()), Duration::ZERO);
        assert_eq!(scheduler.resume_pending().unwrap(), 1);
        scheduler.drain().await;

        assert!(store.pending().unwrap().is_empty());
        assert!(store.get_root_hash(&root().key()).unwrap().is_some());
        assert!(dir.path().join("data/pub1/root").is_dir());
    }

    #[tokio::test]
    async fn failed_update_still_clears_pending() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileNodeStore::open(dir.path().join("index.json")).unwrap());
        let tracker = Arc::new(InMemoryTracker::new());
        tracker.set_offline(true);
        let engine = Arc::new(SyncEngine::new(
            store.clone(),
            tracker,
            SyncConfig::new(dir.path().join("data")),
        ));
        let scheduler = NotificationScheduler::new(engine, Duration::ZERO);

        scheduler.schedule(root()).await.unwrap();
        scheduler.drain().await;
        assert!(store.pending().unwrap().is_empty());
        assert!(store.get_root_hash(&root().key()).unwrap().is_none());
    }

    #[tokio::test]
    async fn panicked_store_write_is_internal() {
        let store: Arc<dyn NodeStore> = Arc::new(cxo_store::InMemoryNodeStore::new());
        let err = store_write(&store, |_| -> StoreResult<()> { panic!("disk gone") })
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Internal(_)));
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
