//! # oolite-replica: the Oolite replication core
//!
//! One [`ReplicaNode`] owns a node's in-memory version store, its
//! pending-repair ledger, and its crash-simulation runtime state, and exposes
//! the full remote-operation contract of a replica:
//!
//! - the replication primitives `local_write` / `local_read`, applied with the
//!   per-key reconcile rule in [`store`];
//! - the quorum coordinator entry points `put` / `get`, which fan out to the
//!   preference list over the [`peer`] seam and keep partial-failure
//!   bookkeeping in the repair ledger;
//! - `trigger_gossip`, the anti-entropy cycle that drains the ledger by
//!   re-pushing version sets to peers that missed a write;
//! - `crash`, the outage simulation gating every other operation.
//!
//! The crate is transport-agnostic: peers are reached through the
//! [`peer::Dialer`] trait, implemented over TCP by `oolite-client` and
//! in-memory by the test suites.

pub mod error;
pub mod gossip;
pub mod ledger;
pub mod node;
pub mod peer;
pub mod runtime;
pub mod store;

mod coordinator;

pub use error::{ReplicaError, Result};
pub use ledger::RepairLedger;
pub use node::{NodeConfig, ReplicaNode};
pub use peer::{Dialer, PeerError, PeerHandle};
pub use runtime::RuntimeState;
pub use store::{Reconciled, VersionStore, fold_version};

// Re-exported so protocol code only needs one crate in scope.
pub use oolite_types::{NodeAddress, NodeId, QuorumParams, VersionVector, VersionedValue};
