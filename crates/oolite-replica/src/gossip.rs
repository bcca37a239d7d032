//! Anti-entropy: draining the repair ledger.
//!
//! For every ledger key and every recorded preference-list position, gossip
//! pushes the key's *current* local version set to that peer via its
//! `local_write` primitive. Delivery is idempotent (re-applying a revision
//! is a no-op under the reconcile rule) so duplicated or reordered cycles
//! are harmless, and convergent: every reachable peer that was ever behind
//! eventually receives the dominant version set.
//!
//! Gossip runs only on demand — there is no internal timer.

use crate::error::Result;
use crate::node::ReplicaNode;

impl ReplicaNode {
    /// Synchronously drains this node's pending-repair ledger.
    ///
    /// A position is removed from the ledger only once every revision of its
    /// key has been pushed successfully; failed peers stay recorded for a
    /// future cycle. Positions that resolve to this node itself, or that
    /// fall outside the current preference list, cannot be repaired and are
    /// dropped.
    pub fn trigger_gossip(&self) -> Result<()> {
        self.runtime().check_available()?;

        // Snapshot the outstanding work and the version sets to push; the
        // lock must not be held across the pushes below.
        let (work, preference_list) = {
            let shared = self.lock_shared();
            let work: Vec<_> = shared
                .ledger
                .keys()
                .into_iter()
                .map(|key| {
                    let positions = shared.ledger.positions(&key);
                    let entries = shared.store.read(&key).map(<[_]>::to_vec).unwrap_or_default();
                    (key, positions, entries)
                })
                .collect();
            (work, shared.preference_list.clone())
        };

        for (key, positions, entries) in work {
            for position in positions {
                let Some(address) = preference_list.get(position) else {
                    tracing::warn!(
                        node = %self.id(), key, position,
                        "repair position outside current preference list; dropping"
                    );
                    self.lock_shared().ledger.complete(&key, position);
                    continue;
                };

                let pushed = self.dialer().dial(address).and_then(|mut peer| {
                    if peer.identity()? == *self.id() {
                        return Ok(false);
                    }
                    for entry in &entries {
                        peer.local_write(&key, entry)?;
                    }
                    Ok(true)
                });

                match pushed {
                    Ok(true) => {
                        tracing::debug!(node = %self.id(), key, position, peer = %address, "repair delivered");
                        self.lock_shared().ledger.complete(&key, position);
                    }
                    Ok(false) => {
                        // Resolved to self: nothing to repair, drop the entry.
                        self.lock_shared().ledger.complete(&key, position);
                    }
                    Err(err) => {
                        tracing::debug!(
                            node = %self.id(), key, position, peer = %address, %err,
                            "repair push failed; keeping ledger entry"
                        );
                    }
                }
            }
        }

        Ok(())
    }
}
