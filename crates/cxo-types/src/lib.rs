//! Foundation types for CXO nodes.
//!
//! Every other CXO crate depends on `cxo-types`. The types here describe the
//! versioned object graph a publisher advertises and a node replicates.
//!
//! # Key Types
//!
//! - [`ContentHash`] -- Opaque content-derived identifier for headers and objects
//! - [`RootHash`] -- One published version of a graph (publisher + sequence)
//! - [`RootHashKey`] -- The `sequence:publisher` key that identifies a sync unit
//! - [`ObjectHeader`] -- A directory or file node of the graph
//! - [`Object`] -- Raw file content addressed by hash

pub mod error;
pub mod hash;
pub mod header;
pub mod name;
pub mod object;
pub mod root_hash;
mod serde_helpers;

pub use error::TypeError;
pub use hash::ContentHash;
pub use header::{MetaEntry, ObjectHeader};
pub use name::validate_path_component;
pub use object::Object;
pub use root_hash::{RootHash, RootHashKey};
