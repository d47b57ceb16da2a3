//! Tracker access for CXO nodes.
//!
//! The tracker serves the published object graph: header batches by hash and
//! raw object content by hash. Nodes reach it through the [`TrackerClient`]
//! seam so the sync pipeline never depends on a concrete transport.
//!
//! - [`HttpTrackerClient`] -- JSON over HTTP with a per-request timeout and
//!   bounded retry
//! - [`InMemoryTracker`] -- scripted tracker for tests and embedding

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod memory;

pub use client::TrackerClient;
pub use config::TrackerConfig;
pub use error::{TrackerError, TrackerResult};
pub use http::HttpTrackerClient;
pub use memory::InMemoryTracker;
