//! Breadth-first header resolution.
//!
//! Each round fetches the whole frontier in one batch. Children already in
//! the store are re-linked to the new key (together with their stored
//! descendants) instead of being fetched; only missing hashes enter the next
//! frontier.

use std::collections::HashSet;
use std::sync::Arc;

use cxo_store::NodeStore;
use cxo_tracker::{TrackerClient, TrackerError};
use cxo_types::{ContentHash, ObjectHeader, RootHash, RootHashKey};

use crate::blocking::store_write;
use crate::error::{SyncError, SyncResult};
use crate::types::{ResolveReport, SyncStage};

pub struct HeaderResolver<'a> {
    store: &'a Arc<dyn NodeStore>,
    tracker: &'a dyn TrackerClient,
    max_rounds: usize,
}

impl<'a> HeaderResolver<'a> {
    pub fn new(
        store: &'a Arc<dyn NodeStore>,
        tracker: &'a dyn TrackerClient,
        max_rounds: usize,
    ) -> Self {
        Self {
            store,
            tracker,
            max_rounds,
        }
    }

    /// Fetch and store every header reachable from `root` that the store
    /// does not hold, linking the whole graph to `root`'s key.
    ///
    /// Each round costs one header fetch and two store writes. Any fetch or
    /// store failure aborts; headers stored by earlier rounds stay in place.
    pub async fn resolve(&self, root: &RootHash) -> SyncResult<ResolveReport> {
        let key = root.key();
        let mut report = ResolveReport::default();
        let mut seen: HashSet<ContentHash> = HashSet::new();
        let mut frontier: Vec<ContentHash> = Vec::new();

        self.visit(
            vec![root.object_header_hash.clone()],
            &key,
            &mut seen,
            &mut frontier,
            &mut report,
        )
        .await?;

        while !frontier.is_empty() {
            if report.rounds >= self.max_rounds {
                return Err(SyncError::TooDeep(self.max_rounds));
            }
            report.rounds += 1;

            let batch = std::mem::take(&mut frontier);
            tracing::debug!(key = %key, round = report.rounds, size = batch.len(), "fetching frontier");
            let headers = self
                .tracker
                .fetch_headers(&batch)
                .await
                .map_err(SyncError::tracker(SyncStage::Resolve))?;
            if headers.len() != batch.len() {
                return Err(SyncError::tracker(SyncStage::Resolve)(
                    TrackerError::BatchMismatch {
                        requested: batch.len(),
                        received: headers.len(),
                    },
                ));
            }

            let fetched: Vec<(ContentHash, ObjectHeader)> = batch.into_iter().zip(headers).collect();
            let children: Vec<ContentHash> = fetched
                .iter()
                .flat_map(|(_, header)| header.children().iter().cloned())
                .collect();
            report.fetched += fetched.len();

            let introducer = root.clone();
            store_write(self.store, SyncStage::Resolve, move |store| {
                store.save_headers(&introducer, &fetched)
            })
            .await?;

            self.visit(children, &key, &mut seen, &mut frontier, &mut report)
                .await?;
        }

        tracing::debug!(
            key = %key,
            rounds = report.rounds,
            fetched = report.fetched,
            relinked = report.relinked,
            "headers resolved"
        );
        Ok(report)
    }

    /// Re-link the unseen `candidates` that are stored and schedule the rest,
    /// plus any stored subtree's missing descendants.
    async fn visit(
        &self,
        candidates: Vec<ContentHash>,
        key: &RootHashKey,
        seen: &mut HashSet<ContentHash>,
        frontier: &mut Vec<ContentHash>,
        report: &mut ResolveReport,
    ) -> SyncResult<()> {
        let fresh: Vec<ContentHash> = candidates
            .into_iter()
            .filter(|hash| seen.insert(hash.clone()))
            .collect();
        if fresh.is_empty() {
            return Ok(());
        }
        let requested: HashSet<ContentHash> = fresh.iter().cloned().collect();

        let link_key = key.clone();
        let outcome = store_write(self.store, SyncStage::Resolve, move |store| {
            store.relink_headers(&fresh, &link_key)
        })
        .await?;

        report.relinked += outcome.relinked;
        for missing in outcome.missing {
            if requested.contains(&missing) || seen.insert(missing.clone()) {
                frontier.push(missing);
            }
        }
        Ok(())
    }
}
