use async_trait::async_trait;
use cxo_types::{ContentHash, Object, ObjectHeader};

use crate::error::TrackerResult;

/// Outbound fetches against the tracker.
///
/// Implementations must answer `fetch_headers` in request order with exactly
/// one header per requested hash, or fail the whole batch.
#[async_trait]
pub trait TrackerClient: Send + Sync {
    /// Fetch one batch of headers.
    async fn fetch_headers(&self, hashes: &[ContentHash]) -> TrackerResult<Vec<ObjectHeader>>;

    /// Fetch the raw content of one object.
    async fn fetch_object(&self, hash: &ContentHash) -> TrackerResult<Object>;
}
