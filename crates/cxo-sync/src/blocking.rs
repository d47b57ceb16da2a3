use std::sync::Arc;

use cxo_store::{NodeStore, StoreError, StoreResult};

use crate::error::{SyncError, SyncResult};
use crate::types::SyncStage;

/// Run a store write on the blocking pool.
///
/// Persistent stores sync to disk inside their writes; keeping that off the
/// async workers means a slow write stalls only the update that issued it.
pub(crate) async fn store_write<T, F>(
    store: &Arc<dyn NodeStore>,
    stage: SyncStage,
    f: F,
) -> SyncResult<T>
where
    F: FnOnce(&dyn NodeStore) -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))
        .and_then(|result| result)
        .map_err(SyncError::store(stage))
}
