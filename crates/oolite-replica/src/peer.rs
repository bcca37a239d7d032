//! The peer seam: how a replica reaches the other nodes on its preference
//! list.
//!
//! The coordinator and the gossip engine never speak a transport directly;
//! they [`Dialer::dial`] an address and drive the returned [`PeerHandle`].
//! `oolite-client` provides the TCP implementation; test suites provide an
//! in-memory one wired straight to other [`ReplicaNode`](crate::ReplicaNode)
//! instances.

use oolite_types::{NodeAddress, NodeId, VersionedValue};
use thiserror::Error;

/// Failure reaching or driving a remote peer.
///
/// The coordinator records these into the repair ledger on write paths and
/// skips over them silently on read paths; the core never retries them.
#[derive(Debug, Error)]
pub enum PeerError {
    /// The peer answered but is in the crashed state.
    #[error("peer unavailable (crashed)")]
    Unavailable,

    /// The peer could not be dialed or the connection broke.
    #[error("peer unreachable: {0}")]
    Unreachable(String),

    /// The peer answered something outside the operation's contract.
    #[error("peer protocol error: {0}")]
    Protocol(String),
}

/// One dialed connection to a peer, scoped to a single coordinator walk.
pub trait PeerHandle {
    /// Resolves the peer's identity. Succeeds even on crashed peers, which
    /// is what lets callers tell "crashed" from "unreachable".
    fn identity(&mut self) -> Result<NodeId, PeerError>;

    /// Applies one revision to the peer's local version set (replica write
    /// or gossip push).
    fn local_write(&mut self, key: &str, entry: &VersionedValue) -> Result<(), PeerError>;

    /// Reads the peer's full local version set for `key`.
    fn local_read(&mut self, key: &str) -> Result<Option<Vec<VersionedValue>>, PeerError>;
}

/// Connects to peers by address.
pub trait Dialer: Send + Sync {
    fn dial(&self, address: &NodeAddress) -> Result<Box<dyn PeerHandle>, PeerError>;
}
