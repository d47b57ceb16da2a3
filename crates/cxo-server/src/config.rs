use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default wait between accepting an announcement and processing it.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Gives the tracker time to make announced content fetchable.
    pub settle_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8098)),
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}
