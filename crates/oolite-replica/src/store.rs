//! Per-node version store and the per-key reconcile rule.
//!
//! # The reconcile rule
//!
//! A key's local state is a small set of concurrent revisions (its
//! *version set*). [`VersionStore::reconcile`] folds an incoming revision in:
//!
//! 1. if the set is empty, or the incoming clock is concurrent with the
//!    existing entries, the incoming revision is **appended** — conflicting
//!    revisions all survive;
//! 2. if the incoming clock strictly dominates the existing entries, it
//!    **replaces** them — the set collapses to just the newcomer;
//! 3. otherwise (dominated by, or equal to, an existing entry) the incoming
//!    revision is **ignored** — the store already holds an equal-or-newer
//!    version.
//!
//! The rule is applied identically whether a write arrives as a direct
//! client Put or as a gossip repair, which is what makes gossip idempotent.
//!
//! # Invariant
//!
//! No two members of a version set are ever causally ordered: every pair is
//! concurrent. A dominated entry is always evicted, never retained, even in
//! the mixed case where an incoming revision dominates one member while
//! being concurrent with another.

use std::collections::HashMap;

use oolite_types::VersionedValue;

/// Outcome of folding one revision into a key's version set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// The revision was added alongside concurrent entries (or to an empty set).
    Appended,

    /// The revision evicted at least one dominated entry.
    Replaced,

    /// An equal-or-newer revision was already held; nothing changed.
    Ignored,
}

/// In-memory map from key to its version set, owned by one node.
#[derive(Debug, Default)]
pub struct VersionStore {
    entries: HashMap<String, Vec<VersionedValue>>,
}

impl VersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the reconcile rule for `key`.
    pub fn reconcile(&mut self, key: &str, incoming: VersionedValue) -> Reconciled {
        let set = self.entries.entry(key.to_string()).or_default();

        // Rule 3: an existing entry already dominates or equals the newcomer.
        if set.iter().any(|held| incoming.clock.le(&held.clock)) {
            return Reconciled::Ignored;
        }

        // The newcomer is unseen: evict everything it dominates, keep
        // genuinely concurrent peers, then append.
        let before = set.len();
        set.retain(|held| !held.clock.le(&incoming.clock));
        let evicted = before - set.len();
        set.push(incoming);

        if evicted > 0 {
            Reconciled::Replaced
        } else {
            Reconciled::Appended
        }
    }

    /// Returns the full version set for `key`; `None` if the key has never
    /// been written on this node.
    pub fn read(&self, key: &str) -> Option<&[VersionedValue]> {
        self.entries.get(key).map(Vec::as_slice)
    }
}

/// Folds one remote-read revision into a Get accumulator.
///
/// Same domination rule as [`VersionStore::reconcile`], plus the two
/// read-side refinements: a revision that is clock-equal *and* byte-equal to
/// an accumulated one deduplicates, and zero-length values (tombstones)
/// never surface.
pub fn fold_version(acc: &mut Vec<VersionedValue>, incoming: VersionedValue) {
    if incoming.is_tombstone() {
        return;
    }
    if acc.iter().any(|held| held == &incoming) {
        return;
    }
    if acc.iter().any(|held| held.clock.dominates(&incoming.clock)) {
        return;
    }
    acc.retain(|held| !incoming.clock.dominates(&held.clock));
    acc.push(incoming);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use oolite_types::{NodeId, VersionVector};
    use proptest::prelude::*;

    fn stamped(value: &str, slots: &[(&str, u64)]) -> VersionedValue {
        let mut clock = VersionVector::new();
        for &(id, count) in slots {
            for _ in 0..count {
                clock.increment(&NodeId::new(id));
            }
        }
        VersionedValue::new(value.as_bytes().to_vec(), clock)
    }

    #[test]
    fn first_write_is_appended() {
        let mut store = VersionStore::new();
        assert_eq!(
            store.reconcile("k", stamped("v1", &[("a", 1)])),
            Reconciled::Appended
        );
        assert_eq!(store.read("k").unwrap().len(), 1);
    }

    #[test]
    fn unknown_key_reads_none() {
        let store = VersionStore::new();
        assert!(store.read("missing").is_none());
    }

    #[test]
    fn dominating_write_replaces_the_set() {
        let mut store = VersionStore::new();
        store.reconcile("k", stamped("v1", &[("a", 1)]));
        assert_eq!(
            store.reconcile("k", stamped("v2", &[("a", 2)])),
            Reconciled::Replaced
        );
        let set = store.read("k").unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].value, Bytes::from("v2"));
    }

    #[test]
    fn concurrent_writes_both_survive() {
        let mut store = VersionStore::new();
        store.reconcile("k", stamped("v1", &[("a", 1)]));
        assert_eq!(
            store.reconcile("k", stamped("v2", &[("b", 1)])),
            Reconciled::Appended
        );
        assert_eq!(store.read("k").unwrap().len(), 2);
    }

    #[test]
    fn dominated_write_is_ignored() {
        let mut store = VersionStore::new();
        store.reconcile("k", stamped("v2", &[("a", 2)]));
        assert_eq!(
            store.reconcile("k", stamped("v1", &[("a", 1)])),
            Reconciled::Ignored
        );
        let set = store.read("k").unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].value, Bytes::from("v2"));
    }

    #[test]
    fn equal_write_is_ignored() {
        let mut store = VersionStore::new();
        store.reconcile("k", stamped("v1", &[("a", 1)]));
        assert_eq!(
            store.reconcile("k", stamped("v1", &[("a", 1)])),
            Reconciled::Ignored
        );
        assert_eq!(store.read("k").unwrap().len(), 1);
    }

    #[test]
    fn mixed_dominance_evicts_only_the_dominated_entry() {
        // Set holds {a:1} and {b:1} (concurrent). An incoming {a:2} dominates
        // the first but is concurrent with the second.
        let mut store = VersionStore::new();
        store.reconcile("k", stamped("v1", &[("a", 1)]));
        store.reconcile("k", stamped("v2", &[("b", 1)]));
        assert_eq!(
            store.reconcile("k", stamped("v3", &[("a", 2)])),
            Reconciled::Replaced
        );
        let set = store.read("k").unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.iter().any(|e| e.value == Bytes::from("v2")));
        assert!(set.iter().any(|e| e.value == Bytes::from("v3")));
    }

    #[test]
    fn fold_filters_tombstones() {
        let mut acc = Vec::new();
        fold_version(&mut acc, stamped("", &[("a", 1)]));
        assert!(acc.is_empty());
    }

    #[test]
    fn fold_dedupes_identical_entries() {
        let mut acc = Vec::new();
        fold_version(&mut acc, stamped("v1", &[("a", 1)]));
        fold_version(&mut acc, stamped("v1", &[("a", 1)]));
        assert_eq!(acc.len(), 1);
    }

    #[test]
    fn fold_keeps_clock_equal_but_distinct_values() {
        let mut acc = Vec::new();
        fold_version(&mut acc, stamped("v1", &[("a", 1)]));
        fold_version(&mut acc, stamped("v2", &[("a", 1)]));
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn fold_evicts_dominated_and_drops_stale() {
        let mut acc = Vec::new();
        fold_version(&mut acc, stamped("v1", &[("a", 1)]));
        fold_version(&mut acc, stamped("v2", &[("a", 2)]));
        assert_eq!(acc.len(), 1);
        assert_eq!(acc[0].value, Bytes::from("v2"));

        // A stale revision arriving after the newer one is dropped.
        fold_version(&mut acc, stamped("v1", &[("a", 1)]));
        assert_eq!(acc.len(), 1);
        assert_eq!(acc[0].value, Bytes::from("v2"));
    }

    fn arb_entry() -> impl Strategy<Value = VersionedValue> {
        (
            prop::collection::btree_map(0u8..3, 1u64..4, 0..3),
            "[a-z]{1,4}",
        )
            .prop_map(|(slots, value)| {
                let mut clock = VersionVector::new();
                for (id, count) in slots {
                    for _ in 0..count {
                        clock.increment(&NodeId::new(format!("n{id}")));
                    }
                }
                VersionedValue::new(value.into_bytes(), clock)
            })
    }

    fn set_of(store: &VersionStore) -> Vec<VersionedValue> {
        store.read("k").map(<[_]>::to_vec).unwrap_or_default()
    }

    fn same_up_to_order(a: &[VersionedValue], b: &[VersionedValue]) -> bool {
        a.len() == b.len() && a.iter().all(|e| b.contains(e))
    }

    proptest! {
        /// Applying the same revision twice yields the same set as once.
        #[test]
        fn reconcile_is_idempotent(entries in prop::collection::vec(arb_entry(), 1..6)) {
            let mut once = VersionStore::new();
            let mut twice = VersionStore::new();
            for entry in &entries {
                once.reconcile("k", entry.clone());
                twice.reconcile("k", entry.clone());
                twice.reconcile("k", entry.clone());
            }
            prop_assert!(same_up_to_order(&set_of(&once), &set_of(&twice)));
        }

        /// Reconciling A then B leaves the same causal frontier as B then A.
        /// (Values are compared by clock only: between clock-equal rivals the
        /// first arrival wins, so the payloads may legitimately differ.)
        #[test]
        fn reconcile_commutes_on_clocks(a in arb_entry(), b in arb_entry()) {
            let mut ab = VersionStore::new();
            ab.reconcile("k", a.clone());
            ab.reconcile("k", b.clone());

            let mut ba = VersionStore::new();
            ba.reconcile("k", b);
            ba.reconcile("k", a);

            let clocks_ab: Vec<_> = set_of(&ab).into_iter().map(|e| e.clock).collect();
            let clocks_ba: Vec<_> = set_of(&ba).into_iter().map(|e| e.clock).collect();
            prop_assert_eq!(clocks_ab.len(), clocks_ba.len());
            prop_assert!(clocks_ab.iter().all(|c| clocks_ba.contains(c)));
        }

        /// No two members of a version set are ever causally ordered.
        #[test]
        fn version_set_members_are_pairwise_concurrent(
            entries in prop::collection::vec(arb_entry(), 1..8)
        ) {
            let mut store = VersionStore::new();
            for entry in entries {
                store.reconcile("k", entry);
            }
            let set = set_of(&store);
            for (i, x) in set.iter().enumerate() {
                for y in &set[i + 1..] {
                    prop_assert!(
                        x.clock == y.clock || x.clock.concurrent(&y.clock),
                        "ordered pair retained: {:?} vs {:?}", x.clock, y.clock
                    );
                }
            }
        }
    }
}
