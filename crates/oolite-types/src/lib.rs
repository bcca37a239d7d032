//! # oolite-types: Core types for Oolite
//!
//! This crate contains shared types used across the Oolite system:
//! - Node identifiers ([`NodeId`], [`NodeAddress`])
//! - Causality tracking ([`VersionVector`])
//! - Versioned payloads ([`VersionedValue`])
//! - Quorum parameters ([`QuorumParams`])

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod clock;
mod version;

pub use clock::VersionVector;
pub use version::VersionedValue;

/// Unique identifier for a replica node.
///
/// The token is opaque: any non-empty string works, and it doubles as the
/// node's slot in every [`VersionVector`]. Assigned at node construction and
/// never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Network endpoint of one replica.
///
/// Immutable once assigned. Rendered as `host:port`, which is also the
/// accepted parse form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeAddress {
    /// Hostname or IP address.
    pub host: String,

    /// TCP port.
    pub port: u16,
}

impl NodeAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Error parsing a `host:port` address string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressParseError {
    /// No `:` separator found.
    #[error("missing ':' separator in address {0:?}")]
    MissingSeparator(String),

    /// Port component is not a valid u16.
    #[error("invalid port in address {0:?}")]
    InvalidPort(String),

    /// Host component is empty.
    #[error("empty host in address {0:?}")]
    EmptyHost(String),
}

impl FromStr for NodeAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Split on the last ':' so IPv6-ish hosts still parse.
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| AddressParseError::MissingSeparator(s.to_string()))?;
        if host.is_empty() {
            return Err(AddressParseError::EmptyHost(s.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| AddressParseError::InvalidPort(s.to_string()))?;
        Ok(Self::new(host, port))
    }
}

/// Write and read quorum sizes.
///
/// A Put is successful once `write` replicas hold the entry (the serving
/// node counts as one of them); a Get is complete once `read` replicas have
/// been consulted. Both include the coordinator itself, so `write = 1`
/// degenerates to purely local writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumParams {
    /// Number of replicas that must acknowledge a write (W).
    pub write: usize,

    /// Number of replicas that must answer a read (R).
    pub read: usize,
}

impl QuorumParams {
    /// Creates quorum parameters, rejecting zero-sized quorums.
    pub fn new(write: usize, read: usize) -> Result<Self, InvalidQuorum> {
        if write == 0 || read == 0 {
            return Err(InvalidQuorum { write, read });
        }
        Ok(Self { write, read })
    }
}

/// Quorum sizes must both be at least one.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid quorum parameters: W={write}, R={read} (both must be >= 1)")]
pub struct InvalidQuorum {
    pub write: usize,
    pub read: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_address_display_roundtrip() {
        let addr = NodeAddress::new("127.0.0.1", 9042);
        assert_eq!(addr.to_string(), "127.0.0.1:9042");
        assert_eq!("127.0.0.1:9042".parse::<NodeAddress>().unwrap(), addr);
    }

    #[test]
    fn node_address_parse_errors() {
        assert_eq!(
            "localhost".parse::<NodeAddress>(),
            Err(AddressParseError::MissingSeparator("localhost".to_string()))
        );
        assert_eq!(
            "localhost:notaport".parse::<NodeAddress>(),
            Err(AddressParseError::InvalidPort("localhost:notaport".to_string()))
        );
        assert_eq!(
            ":9042".parse::<NodeAddress>(),
            Err(AddressParseError::EmptyHost(":9042".to_string()))
        );
    }

    #[test]
    fn quorum_params_reject_zero() {
        assert!(QuorumParams::new(0, 1).is_err());
        assert!(QuorumParams::new(1, 0).is_err());
        let q = QuorumParams::new(2, 2).unwrap();
        assert_eq!(q.write, 2);
        assert_eq!(q.read, 2);
    }

    #[test]
    fn node_id_is_opaque() {
        let id = NodeId::new("node-7");
        assert_eq!(id.as_str(), "node-7");
        assert_eq!(id.to_string(), "node-7");
        assert_eq!(NodeId::from("node-7"), id);
    }
}
