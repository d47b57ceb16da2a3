use std::path::PathBuf;

use cxo_store::StoreError;
use cxo_tracker::TrackerError;
use cxo_types::TypeError;

use crate::types::SyncStage;

/// Errors that abort one update.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("invalid root hash: {0}")]
    Invalid(#[from] TypeError),

    #[error("{stage}: store error: {source}")]
    Store {
        stage: SyncStage,
        #[source]
        source: StoreError,
    },

    #[error("{stage}: tracker error: {source}")]
    Tracker {
        stage: SyncStage,
        #[source]
        source: TrackerError,
    },

    #[error("header resolution exceeded {0} rounds")]
    TooDeep(usize),

    /// The publisher directory could not be created.
    #[error("storage root {}: {source}", path.display())]
    StorageRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// `map_err` adapter tagging a store failure with its stage.
    pub fn store(stage: SyncStage) -> impl FnOnce(StoreError) -> SyncError {
        move |source| SyncError::Store { stage, source }
    }

    /// `map_err` adapter tagging a tracker failure with its stage.
    pub fn tracker(stage: SyncStage) -> impl FnOnce(TrackerError) -> SyncError {
        move |source| SyncError::Tracker { stage, source }
    }

    /// The stage the update was in when it failed.
    pub fn stage(&self) -> SyncStage {
        match self {
            Self::Invalid(_) => SyncStage::Claim,
            Self::Store { stage, .. } | Self::Tracker { stage, .. } => *stage,
            Self::TooDeep(_) => SyncStage::Resolve,
            Self::StorageRoot { .. } => SyncStage::Materialize,
        }
    }
}

/// Result alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
