//! Quorum coordination: the Put and Get entry points.
//!
//! Both walk the preference list in order, skipping entries whose remote
//! identity resolves to this node, until W-1 (resp. R-1) *other* replicas
//! have answered — the local replica always counts as the first member of
//! the quorum. There is no internal parallelism: a slow peer stalls the walk,
//! bounded by the dial layer's own timeout. The shared-state lock is released
//! before the first remote call.

use std::collections::BTreeSet;

use bytes::Bytes;
use oolite_types::{NodeAddress, VersionVector, VersionedValue};

use crate::error::{ReplicaError, Result};
use crate::node::ReplicaNode;
use crate::peer::PeerError;
use crate::store::fold_version;

/// Outcome of one remote replica write attempt.
enum RemoteWrite {
    Acked,
    SelfPeer,
}

/// Outcome of one remote replica read attempt.
enum RemoteRead {
    Replied(Option<Vec<VersionedValue>>),
    SelfPeer,
}

impl ReplicaNode {
    /// Client Put: stamp the write with a fresh clock, apply it locally, and
    /// replicate it to W-1 other preference-list nodes.
    ///
    /// `context` is the vector the client last observed for this key (the
    /// zero vector for a brand-new key). Returns the stored clock so callers
    /// can chain causally dependent writes.
    ///
    /// On partial failure the local write is never rolled back: the failed
    /// preference-list positions land in the repair ledger (replacing any
    /// prior entry for the key) and the error reports the shortfall.
    pub fn put(
        &self,
        key: &str,
        value: impl Into<Bytes>,
        context: VersionVector,
    ) -> Result<VersionVector> {
        self.runtime().check_available()?;

        let mut clock = context;
        let value = value.into();

        // Stamp and apply locally under the lock; snapshot the preference
        // list so the fan-out below runs without it.
        let preference_list = {
            let mut shared = self.lock_shared();

            // Reject writes made from stale knowledge: a strictly newer,
            // non-conflicting revision already exists here.
            if let Some(held) = shared.store.read(key) {
                if held.iter().any(|entry| entry.clock.dominates(&clock)) {
                    return Err(ReplicaError::StaleContext);
                }
            }

            clock.increment(self.id());
            let entry = VersionedValue::new(value.clone(), clock.clone());
            shared.store.reconcile(key, entry);
            shared.preference_list.clone()
        };

        let entry = VersionedValue::new(value, clock.clone());
        let needed = self.quorum().write.saturating_sub(1);
        let mut acked = 0;
        let mut failed = BTreeSet::new();

        for (position, address) in preference_list.iter().enumerate() {
            if acked >= needed {
                // Quorum met: remaining peers are intentionally left
                // untried and unscheduled.
                break;
            }
            match self.remote_write(address, key, &entry) {
                Ok(RemoteWrite::Acked) => acked += 1,
                Ok(RemoteWrite::SelfPeer) => {}
                Err(err) => {
                    tracing::debug!(
                        node = %self.id(), key, position, peer = %address, %err,
                        "replica write failed; scheduling repair"
                    );
                    failed.insert(position);
                }
            }
        }

        self.lock_shared().ledger.record(key, failed);

        if acked >= needed {
            tracing::debug!(node = %self.id(), key, acked, "write quorum met");
            Ok(clock)
        } else {
            Err(ReplicaError::WriteQuorumNotMet { acked, needed })
        }
    }

    /// Client Get: the union of this node's version set with those of up to
    /// R-1 other preference-list nodes, reduced by causal dominance.
    ///
    /// Unreachable peers are skipped silently and do not count toward R-1.
    /// More than one returned entry is the conflict signal: the caller
    /// resolves it and writes back with a merged context. Tombstones never
    /// surface.
    pub fn get(&self, key: &str) -> Result<Vec<VersionedValue>> {
        self.runtime().check_available()?;

        // Seed from the local set; absence is not fatal.
        let (mut gathered, preference_list) = {
            let shared = self.lock_shared();
            let mut acc = Vec::new();
            if let Some(held) = shared.store.read(key) {
                for entry in held {
                    fold_version(&mut acc, entry.clone());
                }
            }
            (acc, shared.preference_list.clone())
        };

        let needed = self.quorum().read.saturating_sub(1);
        let mut replied = 0;

        for address in &preference_list {
            if replied >= needed {
                break;
            }
            match self.remote_read(address, key) {
                Ok(RemoteRead::Replied(set)) => {
                    for entry in set.unwrap_or_default() {
                        fold_version(&mut gathered, entry);
                    }
                    replied += 1;
                }
                Ok(RemoteRead::SelfPeer) => {}
                Err(err) => {
                    // Reads tolerate missing replicas without retry.
                    tracing::debug!(node = %self.id(), key, peer = %address, %err, "read fan-out skip");
                }
            }
        }

        if replied >= needed {
            Ok(gathered)
        } else {
            Err(ReplicaError::ReadQuorumNotMet {
                replied,
                needed,
                gathered,
            })
        }
    }

    fn remote_write(
        &self,
        address: &NodeAddress,
        key: &str,
        entry: &VersionedValue,
    ) -> std::result::Result<RemoteWrite, PeerError> {
        let mut peer = self.dialer().dial(address)?;
        if peer.identity()? == *self.id() {
            return Ok(RemoteWrite::SelfPeer);
        }
        peer.local_write(key, entry)?;
        Ok(RemoteWrite::Acked)
    }

    fn remote_read(
        &self,
        address: &NodeAddress,
        key: &str,
    ) -> std::result::Result<RemoteRead, PeerError> {
        let mut peer = self.dialer().dial(address)?;
        if peer.identity()? == *self.id() {
            return Ok(RemoteRead::SelfPeer);
        }
        Ok(RemoteRead::Replied(peer.local_read(key)?))
    }
}
