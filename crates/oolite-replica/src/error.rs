//! Replication error taxonomy.
//!
//! Every failure is a value; nothing here is process-fatal, and nothing is
//! retried automatically by the core — the only repair mechanism is the
//! explicitly triggered gossip cycle.

use oolite_types::VersionedValue;
use thiserror::Error;

/// Result type for replica operations.
pub type Result<T> = std::result::Result<T, ReplicaError>;

/// Errors surfaced by a replica node's remote operations.
#[derive(Debug, Error)]
pub enum ReplicaError {
    /// The node is in the crashed state; callers see this from every remote
    /// operation except identity resolution and the crash control itself.
    #[error("node unavailable (crashed)")]
    Unavailable,

    /// `crash` was invoked while the node is already crashed.
    #[error("node is already crashed")]
    AlreadyCrashed,

    /// The client wrote from stale knowledge: a newer, non-conflicting
    /// revision of the key is already held locally. The caller must re-read
    /// and retry with a fresh context.
    #[error("stale causal context: a newer revision of the key is held locally")]
    StaleContext,

    /// Fewer than W-1 other replicas acknowledged the write before the
    /// preference list was exhausted. The local write is NOT rolled back.
    #[error("write quorum not met: {acked} of {needed} other replicas acknowledged")]
    WriteQuorumNotMet { acked: usize, needed: usize },

    /// Fewer than R-1 other replicas answered the read before the preference
    /// list was exhausted. Carries whatever was gathered so a degraded read
    /// stays observable.
    #[error("read quorum not met: {replied} of {needed} other replicas answered")]
    ReadQuorumNotMet {
        replied: usize,
        needed: usize,
        gathered: Vec<VersionedValue>,
    },
}
