//! HTTP front end for CXO nodes.
//!
//! Accepts root-hash announcements, acknowledges them immediately, and hands
//! them to a [`NotificationScheduler`] that runs the sync pipeline after the
//! settle delay. Scheduled work is persisted as pending and tied to the
//! server's lifetime, so a shutdown never silently drops an update.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod scheduler;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use scheduler::NotificationScheduler;
pub use server::CxoServer;
