use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use cxo_types::{ContentHash, Object, ObjectHeader};

use crate::client::TrackerClient;
use crate::error::{TrackerError, TrackerResult};

#[derive(Default)]
struct Inner {
    headers: HashMap<ContentHash, ObjectHeader>,
    objects: HashMap<ContentHash, Object>,
    failing_objects: HashSet<ContentHash>,
    offline: bool,
    header_batches: Vec<Vec<ContentHash>>,
    object_requests: Vec<ContentHash>,
}

/// Scripted in-memory tracker.
///
/// Serves whatever was inserted and records every request so callers can
/// assert on fetch counts. Individual objects can be made to fail and the
/// whole tracker can be taken offline.
#[derive(Default)]
pub struct InMemoryTracker {
    inner: Mutex<Inner>,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> TrackerResult<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| TrackerError::Unavailable("tracker state poisoned".into()))
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> Option<T> {
        self.inner.lock().ok().map(|mut inner| f(&mut inner))
    }

    pub fn insert_header(&self, hash: ContentHash, header: ObjectHeader) {
        self.with_inner(|i| i.headers.insert(hash, header));
    }

    /// Store `data` under its digest and return the digest.
    pub fn insert_object(&self, data: impl Into<Vec<u8>>) -> ContentHash {
        let object = Object::new(data.into());
        let hash = object.digest();
        self.insert_object_as(hash.clone(), object);
        hash
    }

    pub fn insert_object_as(&self, hash: ContentHash, object: Object) {
        self.with_inner(|i| i.objects.insert(hash, object));
    }

    /// Make every fetch of `hash` fail as if the tracker were down.
    pub fn fail_object(&self, hash: ContentHash) {
        self.with_inner(|i| i.failing_objects.insert(hash));
    }

    pub fn set_offline(&self, offline: bool) {
        self.with_inner(|i| i.offline = offline);
    }

    /// Header batches requested so far, in call order.
    pub fn header_batches(&self) -> Vec<Vec<ContentHash>> {
        self.with_inner(|i| i.header_batches.clone())
            .unwrap_or_default()
    }

    pub fn requested_headers(&self) -> Vec<ContentHash> {
        self.header_batches().into_iter().flatten().collect()
    }

    pub fn object_requests(&self) -> Vec<ContentHash> {
        self.with_inner(|i| i.object_requests.clone())
            .unwrap_or_default()
    }

    /// Total fetch calls of either kind.
    pub fn fetch_count(&self) -> usize {
        self.with_inner(|i| i.header_batches.len() + i.object_requests.len())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TrackerClient for InMemoryTracker {
    async fn fetch_headers(&self, hashes: &[ContentHash]) -> TrackerResult<Vec<ObjectHeader>> {
        let mut inner = self.lock()?;
        inner.header_batches.push(hashes.to_vec());
        if inner.offline {
            return Err(TrackerError::Unavailable("offline".into()));
        }
        hashes
            .iter()
            .map(|hash| {
                inner
                    .headers
                    .get(hash)
                    .cloned()
                    .ok_or_else(|| TrackerError::NotFound(hash.clone()))
            })
            .collect()
    }

    async fn fetch_object(&self, hash: &ContentHash) -> TrackerResult<Object> {
        let mut inner = self.lock()?;
        inner.object_requests.push(hash.clone());
        if inner.offline || inner.failing_objects.contains(hash) {
            return Err(TrackerError::Unavailable(format!("object {hash}")));
        }
        inner
            .objects
            .get(hash)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(hash.clone()))
    }
}
