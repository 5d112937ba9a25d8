//! Cluster Configuration
//!
//! Settings for the coordinator, storage nodes and the client, grouped into one
//! section per role. Every field has a default, so a JSON file only needs to name
//! the values it changes. Durations are stored in milliseconds.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub coordinator: CoordinatorConfig,
    pub node: NodeConfig,
    pub client: ClientConfig,
}

impl Config {
    /// Loads a JSON config file; missing sections and fields take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.coordinator.validate()?;
        self.node.validate()?;

        if self.node.heartbeat_interval() >= self.coordinator.eviction_timeout() {
            return Err(ConfigError::Invalid(format!(
                "heartbeat interval ({:?}) must be shorter than the eviction timeout ({:?})",
                self.node.heartbeat_interval(),
                self.coordinator.eviction_timeout()
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub listen_addr: String,
    /// A node silent for longer than this is evicted from the ring.
    pub eviction_timeout_ms: u64,
    /// How often the reaper scans the heartbeat table.
    pub reaper_interval_ms: u64,
    /// Size of the replica set returned by `GET_NODES_FOR_KEY` (primary included).
    pub replication_factor: usize,
    pub virtual_nodes: u32,
    pub io_timeout_ms: u64,
}

impl CoordinatorConfig {
    pub fn eviction_timeout(&self) -> Duration {
        Duration::from_millis(self.eviction_timeout_ms)
    }

    pub fn reaper_interval(&self) -> Duration {
        Duration::from_millis(self.reaper_interval_ms)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.replication_factor == 0 {
            return Err(ConfigError::Invalid(
                "replication_factor must be at least 1".to_string(),
            ));
        }
        if self.virtual_nodes == 0 {
            return Err(ConfigError::Invalid(
                "virtual_nodes must be at least 1".to_string(),
            ));
        }
        if self.eviction_timeout_ms == 0 || self.reaper_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "eviction_timeout_ms and reaper_interval_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:5000".to_string(),
            eviction_timeout_ms: 10_000,
            reaper_interval_ms: 5_000,
            replication_factor: 3,
            virtual_nodes: 3,
            io_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Host advertised to the coordinator and bound by the listener.
    pub host: String,
    /// Listening port; `0` picks a free port, which is then registered.
    pub port: u16,
    pub coordinator_addr: String,
    pub heartbeat_interval_ms: u64,
    pub io_timeout_ms: u64,
    pub replication_timeout_ms: u64,
}

impl NodeConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    pub fn replication_timeout(&self) -> Duration {
        Duration::from_millis(self.replication_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heartbeat_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "heartbeat_interval_ms must be non-zero".to_string(),
            ));
        }
        if self.host.is_empty() {
            return Err(ConfigError::Invalid("node host is empty".to_string()));
        }
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5001,
            coordinator_addr: "127.0.0.1:5000".to_string(),
            heartbeat_interval_ms: 3_000,
            io_timeout_ms: 5_000,
            replication_timeout_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub coordinator_addr: String,
    pub io_timeout_ms: u64,
}

impl ClientConfig {
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            coordinator_addr: "127.0.0.1:5000".to_string(),
            io_timeout_ms: 5_000,
        }
    }
}
