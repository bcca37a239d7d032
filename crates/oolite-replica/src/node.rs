//! The replica node: remote-operation contract and shared per-node state.
//!
//! One [`ReplicaNode`] owns the version store, the repair ledger, and the
//! node's view of the preference list behind a single mutex domain; the
//! runtime (crash) state synchronizes itself. The lock is never held across
//! a remote call: the coordinator and the gossip engine snapshot what they
//! need, release, and re-lock to record outcomes.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use oolite_types::{NodeAddress, NodeId, QuorumParams, VersionedValue};

use crate::error::Result;
use crate::ledger::RepairLedger;
use crate::peer::Dialer;
use crate::runtime::RuntimeState;
use crate::store::VersionStore;

/// Construction-time parameters of one replica.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// This node's identity token (the causality-vector slot it increments).
    pub id: NodeId,

    /// This node's own endpoint.
    pub address: NodeAddress,

    /// Write and read quorum sizes.
    pub quorum: QuorumParams,
}

/// State guarded by the node's single mutex domain.
///
/// Put, `local_write`, and the gossip drain all read and mutate the store
/// and the ledger from independent request paths, so they share one lock.
pub(crate) struct Shared {
    pub(crate) store: VersionStore,
    pub(crate) ledger: RepairLedger,
    pub(crate) preference_list: Vec<NodeAddress>,
}

/// One replica of the store: remote operations, quorum coordination, gossip.
pub struct ReplicaNode {
    config: NodeConfig,
    shared: Mutex<Shared>,
    runtime: RuntimeState,
    dialer: Arc<dyn Dialer>,
}

impl ReplicaNode {
    /// Creates a node with an empty store and an empty preference list.
    pub fn new(config: NodeConfig, dialer: Arc<dyn Dialer>) -> Self {
        Self {
            config,
            shared: Mutex::new(Shared {
                store: VersionStore::new(),
                ledger: RepairLedger::new(),
                preference_list: Vec::new(),
            }),
            runtime: RuntimeState::new(),
            dialer,
        }
    }

    /// Identity resolution. Answers even while crashed: this is the one
    /// operation that lets peers tell a crashed node from an unreachable one.
    pub fn id(&self) -> &NodeId {
        &self.config.id
    }

    /// This node's own endpoint.
    pub fn address(&self) -> &NodeAddress {
        &self.config.address
    }

    /// Replaces this node's view of the cluster.
    pub fn set_preference_list(&self, list: Vec<NodeAddress>) -> Result<()> {
        self.runtime.check_available()?;
        tracing::debug!(node = %self.config.id, peers = list.len(), "preference list replaced");
        self.lock_shared().preference_list = list;
        Ok(())
    }

    /// Replication primitive: applies the reconcile rule to the local
    /// version set for `key`. No remote fan-out. Serves both direct replica
    /// writes and gossip pushes.
    pub fn local_write(&self, key: &str, entry: VersionedValue) -> Result<()> {
        self.runtime.check_available()?;
        let outcome = self.lock_shared().store.reconcile(key, entry);
        tracing::trace!(node = %self.config.id, key, ?outcome, "local write");
        Ok(())
    }

    /// Replication primitive: the full locally held version set for `key`,
    /// `None` if the key has never been written on this node.
    pub fn local_read(&self, key: &str) -> Result<Option<Vec<VersionedValue>>> {
        self.runtime.check_available()?;
        Ok(self.lock_shared().store.read(key).map(<[_]>::to_vec))
    }

    /// Simulates an outage: the node refuses every remote operation except
    /// identity and crash control until `duration` elapses.
    pub fn crash(&self, duration: Duration) -> Result<()> {
        let result = self.runtime.crash(duration);
        if result.is_ok() {
            tracing::info!(node = %self.config.id, ?duration, "node crashed");
        }
        result
    }

    /// True iff the node is currently refusing operations.
    pub fn is_crashed(&self) -> bool {
        self.runtime.is_crashed()
    }

    pub(crate) fn quorum(&self) -> QuorumParams {
        self.config.quorum
    }

    pub(crate) fn runtime(&self) -> &RuntimeState {
        &self.runtime
    }

    pub(crate) fn dialer(&self) -> &Arc<dyn Dialer> {
        &self.dialer
    }

    pub(crate) fn lock_shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
