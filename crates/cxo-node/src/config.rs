//! TOML configuration for the CXO node.
//!
//! Every section and field is optional; missing values fall back to the
//! defaults below. Command-line flags override the file.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use cxo_server::ServerConfig;
use cxo_sync::{GcPolicy, SyncConfig, DEFAULT_MAX_RESOLVE_ROUNDS};
use cxo_tracker::TrackerConfig;

use crate::cli::StartArgs;

/// File name of the index when `[storage] index_path` is unset.
pub const DEFAULT_INDEX_FILE: &str = ".cxo-index.json";

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub server: ServerSection,
    pub storage: StorageSection,
    pub tracker: TrackerSection,
    pub sync: SyncSection,
    pub log: LogSection,
}

/// `[server]` section.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub listen_addr: String,
    /// Wait between accepting an announcement and processing it.
    pub settle_delay_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8098".to_string(),
            settle_delay_ms: 3000,
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Materialized content, one directory per publisher.
    pub root: PathBuf,
    /// Association index. Defaults to `<root>/.cxo-index.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_path: Option<PathBuf>,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./cxo-storage"),
            index_path: None,
        }
    }
}

/// `[tracker]` section.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSection {
    pub address: String,
    pub request_timeout_secs: u64,
    /// Extra attempts for transport errors and 5xx responses.
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for TrackerSection {
    fn default() -> Self {
        let defaults = TrackerConfig::default();
        Self {
            address: defaults.address,
            request_timeout_secs: defaults.request_timeout.as_secs(),
            max_retries: defaults.max_retries,
            retry_delay_ms: defaults.retry_delay.as_millis() as u64,
        }
    }
}

/// `[sync]` section.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    pub max_resolve_rounds: usize,
    pub gc_policy: GcPolicy,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            max_resolve_rounds: DEFAULT_MAX_RESOLVE_ROUNDS,
            gc_policy: GcPolicy::default(),
        }
    }
}

/// `[log]` section.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Filter directive (e.g. `"info"`, `"cxo_sync=debug"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl NodeConfig {
    /// Load config from a TOML file, or use defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("cannot read {}", p.display()))?;
                Self::from_toml(&content).with_context(|| format!("invalid config {}", p.display()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply `start` flags on top of the file.
    pub fn with_overrides(mut self, args: &StartArgs) -> Self {
        if let Some(listen) = &args.listen {
            self.server.listen_addr = listen.clone();
        }
        if let Some(storage) = &args.storage {
            self.storage.root = storage.clone();
        }
        if let Some(tracker) = &args.tracker {
            self.tracker.address = tracker.clone();
        }
        self
    }

    pub fn index_path(&self) -> PathBuf {
        self.storage
            .index_path
            .clone()
            .unwrap_or_else(|| self.storage.root.join(DEFAULT_INDEX_FILE))
    }

    pub fn server_config(&self) -> anyhow::Result<ServerConfig> {
        let listen_addr: SocketAddr = self
            .server
            .listen_addr
            .parse()
            .with_context(|| format!("invalid listen address {:?}", self.server.listen_addr))?;
        Ok(ServerConfig {
            listen_addr,
            settle_delay: Duration::from_millis(self.server.settle_delay_ms),
        })
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            address: self.tracker.address.clone(),
            request_timeout: Duration::from_secs(self.tracker.request_timeout_secs),
            max_retries: self.tracker.max_retries,
            retry_delay: Duration::from_millis(self.tracker.retry_delay_ms),
        }
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            storage_root: self.storage.root.clone(),
            max_resolve_rounds: self.sync.max_resolve_rounds,
            gc_policy: self.sync.gc_policy,
        }
    }
}
