//! Pending-repair ledger: which preference-list peers still owe a write.
//!
//! The coordinator records, per key, the preference-list positions that did
//! not receive the latest write; the gossip engine drains them. A new
//! partial write replaces the prior ledger entry for its key wholesale — the
//! store already holds the current version set, so older repair obligations
//! are subsumed by the newer one.

use std::collections::{BTreeSet, HashMap};

/// Per-key set of preference-list positions awaiting gossip repair.
#[derive(Debug, Default)]
pub struct RepairLedger {
    pending: HashMap<String, BTreeSet<usize>>,
}

impl RepairLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pending positions for `key`, replacing any prior entry.
    /// An empty set clears the key from the ledger.
    pub fn record(&mut self, key: &str, positions: BTreeSet<usize>) {
        if positions.is_empty() {
            self.pending.remove(key);
        } else {
            self.pending.insert(key.to_string(), positions);
        }
    }

    /// Keys with outstanding repairs.
    pub fn keys(&self) -> Vec<String> {
        self.pending.keys().cloned().collect()
    }

    /// Pending positions for `key` (empty if none).
    pub fn positions(&self, key: &str) -> BTreeSet<usize> {
        self.pending.get(key).cloned().unwrap_or_default()
    }

    /// Marks one position repaired; drops the key once nothing is pending.
    pub fn complete(&mut self, key: &str, position: usize) {
        if let Some(positions) = self.pending.get_mut(key) {
            positions.remove(&position);
            if positions.is_empty() {
                self.pending.remove(key);
            }
        }
    }

    /// True iff no key has outstanding repairs.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
