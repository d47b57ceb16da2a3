//! Storage facade for CXO nodes.
//!
//! The node keeps an association index next to the files it materializes:
//! which root-hash versions it has seen, which headers each version links,
//! and which on-disk path belongs to which header or object. Deduplication
//! and garbage collection are both queries over this index.
//!
//! # Backends
//!
//! All backends implement the [`NodeStore`] trait:
//!
//! - [`InMemoryNodeStore`] -- lost on drop; for tests and embedding
//! - [`FileNodeStore`] -- the same index persisted as a JSON snapshot after
//!   every mutation; batch methods keep that to one write per round
//!
//! # Rules
//!
//! 1. Every operation is atomic: claims, relinks, batches and collections
//!    are never observed half-applied.
//! 2. Headers are never rewritten once stored, only linked to more keys.
//! 3. Absence is `Ok(None)`, not an error.

pub mod error;
pub mod file;
mod index;
pub mod memory;
pub mod record;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::FileNodeStore;
pub use memory::InMemoryNodeStore;
pub use record::{HeaderRecord, IndexStats, PathRecord, RelinkOutcome, RootHashClaim};
pub use traits::NodeStore;
