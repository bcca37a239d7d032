//! Configuration management for an Oolite node.
//!
//! Hierarchical loading, highest precedence last:
//! 1. Built-in defaults
//! 2. `oolite.toml` in the project directory
//! 3. Environment variables (`OOLITE_*` prefix)
//!
//! The on-disk shape keeps addresses and quorum sizes as plain strings and
//! integers; [`OoliteConfig::validate`] is the bridge into the typed forms
//! the rest of the system uses.

use serde::{Deserialize, Serialize};

use oolite_types::{NodeAddress, NodeId, QuorumParams};

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

/// Root configuration for one node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OoliteConfig {
    pub node: NodeSection,
    pub quorum: QuorumSection,
    pub cluster: ClusterSection,
}

/// Identity and listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    /// Stable identity token; must be unique across the cluster.
    pub id: String,

    /// `host:port` the server listens on.
    pub bind_address: String,
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            id: "oolite-0".to_string(),
            bind_address: "127.0.0.1:7400".to_string(),
        }
    }
}

/// Write and read quorum sizes, coordinator included.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuorumSection {
    pub write: usize,
    pub read: usize,
}

impl Default for QuorumSection {
    fn default() -> Self {
        Self { write: 1, read: 1 }
    }
}

/// Cluster membership.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSection {
    /// Preference list, in walk order, as `host:port` strings. The node's
    /// own address is expected to appear in it. Empty means a cluster of
    /// one: the node serves with only itself on the list.
    pub peers: Vec<String>,
}

impl OoliteConfig {
    /// Checks the raw fields and produces the typed [`ValidConfig`].
    pub fn validate(&self) -> Result<ValidConfig, ConfigError> {
        if self.node.id.trim().is_empty() {
            return Err(ConfigError::Validation("node.id must not be empty".into()));
        }
        let bind_address: NodeAddress = self
            .node
            .bind_address
            .parse()
            .map_err(|error| ConfigError::Validation(format!("node.bind_address: {error}")))?;
        let quorum = QuorumParams::new(self.quorum.write, self.quorum.read)
            .map_err(|error| ConfigError::Validation(error.to_string()))?;

        let mut preference_list = Vec::with_capacity(self.cluster.peers.len());
        for peer in &self.cluster.peers {
            let address: NodeAddress = peer
                .parse()
                .map_err(|error| ConfigError::Validation(format!("cluster.peers: {error}")))?;
            preference_list.push(address);
        }
        if preference_list.is_empty() {
            preference_list.push(bind_address.clone());
        }

        let replicas = preference_list.len();
        if self.quorum.write > replicas || self.quorum.read > replicas {
            return Err(ConfigError::Validation(format!(
                "quorum sizes (W={}, R={}) exceed the {replicas}-entry preference list",
                self.quorum.write, self.quorum.read
            )));
        }

        Ok(ValidConfig {
            id: NodeId::new(&self.node.id),
            bind_address,
            quorum,
            preference_list,
        })
    }

    /// Renders the effective configuration as TOML.
    pub fn render(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Render)
    }
}

/// The validated, typed view of [`OoliteConfig`].
#[derive(Debug, Clone)]
pub struct ValidConfig {
    pub id: NodeId,
    pub bind_address: NodeAddress,
    pub quorum: QuorumParams,
    pub preference_list: Vec<NodeAddress>,
}
