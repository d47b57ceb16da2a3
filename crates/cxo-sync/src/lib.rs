//! Synchronization engine for CXO nodes.
//!
//! One announced root hash flows through four stages:
//!
//! 1. **Claim** -- the store's atomic idempotency gate; known or superseded
//!    keys stop here.
//! 2. **Resolve** -- breadth-first header resolution against the tracker,
//!    re-linking anything already stored instead of fetching it again.
//! 3. **Materialize** -- write the headers introduced by this version as
//!    directories and files under `<storage_root>/<publisher>`.
//! 4. **Collect** -- delete what the publisher's latest version no longer
//!    reaches.
//!
//! [`SyncEngine`] drives the stages and runs one publisher's updates one at
//! a time; the stage types are public so they can be exercised on their own.
//! Store writes go through the blocking pool.

mod blocking;
pub mod engine;
pub mod error;
pub mod gc;
pub mod materializer;
pub mod resolver;
pub mod types;

pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use gc::GarbageCollector;
pub use materializer::Materializer;
pub use resolver::HeaderResolver;
pub use types::{
    GcPolicy, GcReport, MaterializeReport, ResolveReport, SyncConfig, SyncOutcome, SyncReport,
    SyncStage, DEFAULT_MAX_RESOLVE_ROUNDS,
};
