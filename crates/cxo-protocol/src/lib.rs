//! Wire protocol for CXO nodes.
//!
//! Defines the announcement payload accepted by the notification endpoint,
//! the message shapes exchanged with the tracker, and the HTTP paths both
//! sides agree on.

pub mod codec;
pub mod endpoint;
pub mod error;
pub mod message;

pub use codec::AnnouncementCodec;
pub use endpoint::{endpoints, HealthResponse, HASH_PARAM};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{AnnounceAck, ErrorResponse, GetObjectHeadersResponse, PROTOCOL_VERSION};
