use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use cxo_types::{ContentHash, RootHashKey};

/// Default bound on breadth-first resolution rounds.
pub const DEFAULT_MAX_RESOLVE_ROUNDS: usize = 1024;

/// Pipeline stage, attached to errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncStage {
    Claim,
    Resolve,
    NewSet,
    Materialize,
    Collect,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Claim => "claim",
            Self::Resolve => "resolve",
            Self::NewSet => "new-set",
            Self::Materialize => "materialize",
            Self::Collect => "collect",
        };
        f.write_str(name)
    }
}

/// When garbage collection runs after an update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GcPolicy {
    /// Collect whenever header resolution succeeded, even if some leaves
    /// failed to materialize.
    #[default]
    AfterResolution,
    /// Collect only when every leaf materialized.
    RequireCleanMaterialize,
    Disabled,
}

/// Engine settings.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Directory holding one subdirectory per publisher.
    pub storage_root: PathBuf,
    pub max_resolve_rounds: usize,
    pub gc_policy: GcPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("./cxo-storage"),
            max_resolve_rounds: DEFAULT_MAX_RESOLVE_ROUNDS,
            gc_policy: GcPolicy::default(),
        }
    }
}

impl SyncConfig {
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Batched fetch rounds issued.
    pub rounds: usize,
    /// Headers fetched and stored.
    pub fetched: usize,
    /// Stored headers re-linked instead of fetched.
    pub relinked: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    pub directories: usize,
    pub files: usize,
    /// Nodes left alone because they were already in place.
    pub skipped: usize,
    /// Headers whose directory or file could not be produced.
    pub failed: Vec<ContentHash>,
}

impl MaterializeReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GcReport {
    pub removed: usize,
    pub failed: usize,
    /// Paths outside the storage root that were not touched.
    pub refused: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncReport {
    pub key: RootHashKey,
    pub resolve: ResolveReport,
    /// Size of the new set handed to the materializer.
    pub new_hashes: usize,
    pub materialize: MaterializeReport,
    /// `None` when the GC policy skipped collection.
    pub gc: Option<GcReport>,
}

/// How an announcement ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The key was already recorded; nothing was done.
    AlreadyKnown,
    /// A newer sequence for the publisher is already recorded.
    Superseded { latest: u64 },
    Completed(SyncReport),
}
