//! Version vectors: per-node counters deciding causal order between writes.
//!
//! # Overview
//!
//! Every accepted write is stamped with a [`VersionVector`]: a map from
//! [`NodeId`] to a monotonically increasing counter. Comparing two vectors
//! component-wise yields exactly one of three verdicts for distinct vectors:
//! one strictly dominates the other (it causally supersedes it), or neither
//! does and the writes are **concurrent** — both must be retained as a
//! conflict.
//!
//! # Representation
//!
//! The vector is sparse: a node absent from the map has counter zero, and a
//! freshly created vector is empty (all zeros). This removes any ceiling on
//! cluster size and any assumption that node identities are small integers.
//! Counters are never stored at zero, so the map stays minimal; equality is
//! nevertheless defined semantically (`le` in both directions) so that a
//! vector deserialized with explicit zero slots still compares correctly.
//!
//! # Merging
//!
//! [`VersionVector::merge`] is the component-wise maximum: the standard join
//! for version vectors. It is commutative, associative, and idempotent,
//! which is what makes gossip convergent regardless of message order or
//! duplication. Merge does not implicitly fold in `self`; callers that need
//! their own vector reflected must include it in the input set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::NodeId;

/// A sparse version vector: `NodeId -> u64`, missing entries read as zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionVector {
    counters: BTreeMap<NodeId, u64>,
}

impl VersionVector {
    /// Creates a fresh, all-zeros vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the counter for `node` (zero if absent).
    pub fn counter(&self, node: &NodeId) -> u64 {
        self.counters.get(node).copied().unwrap_or(0)
    }

    /// Bumps the counter at `node`'s slot by one.
    ///
    /// Called exactly once per accepted client Put, by the node serving
    /// that Put, before replication.
    pub fn increment(&mut self, node: &NodeId) {
        *self.counters.entry(node.clone()).or_insert(0) += 1;
    }

    /// True iff every counter of `self` is <= the corresponding counter of
    /// `other`: `self` causally precedes or equals `other`.
    pub fn le(&self, other: &Self) -> bool {
        self.counters
            .iter()
            .all(|(node, &count)| count <= other.counter(node))
    }

    /// True iff `self` strictly dominates `other`: `self` is causally newer.
    pub fn dominates(&self, other: &Self) -> bool {
        other.le(self) && self != other
    }

    /// True iff neither vector causally precedes the other.
    pub fn concurrent(&self, other: &Self) -> bool {
        !self.le(other) && !other.le(self)
    }

    /// Component-wise maximum across `vectors`: a vector that dominates or
    /// equals every input.
    pub fn merge<'a>(vectors: impl IntoIterator<Item = &'a Self>) -> Self {
        let mut merged = Self::new();
        for vector in vectors {
            for (node, &count) in &vector.counters {
                if count == 0 {
                    continue;
                }
                let slot = merged.counters.entry(node.clone()).or_insert(0);
                *slot = (*slot).max(count);
            }
        }
        merged
    }

    /// True iff no counter has ever been incremented.
    pub fn is_zero(&self) -> bool {
        self.counters.values().all(|&count| count == 0)
    }
}

// Semantic equality: explicit zero slots compare equal to missing slots.
impl PartialEq for VersionVector {
    fn eq(&self, other: &Self) -> bool {
        self.le(other) && other.le(self)
    }
}

impl Eq for VersionVector {}
