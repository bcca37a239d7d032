//! Versioned payloads: one causally-distinct revision of a key.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::VersionVector;

/// One revision of a key: the payload plus the version vector stamped on it.
///
/// Versioned values are created on Put, may be evicted when a dominating
/// revision arrives, and are never mutated in place. A zero-length payload
/// is a tombstone marker and is filtered from read results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedValue {
    /// The payload bytes.
    pub value: Bytes,

    /// The causality stamp assigned by the coordinating node.
    pub clock: VersionVector,
}

impl VersionedValue {
    pub fn new(value: impl Into<Bytes>, clock: VersionVector) -> Self {
        Self {
            value: value.into(),
            clock,
        }
    }

    /// True iff the payload is empty (tombstone / no-value marker).
    pub fn is_tombstone(&self) -> bool {
        self.value.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeId;

    #[test]
    fn tombstone_is_empty_payload() {
        let mut clock = VersionVector::new();
        clock.increment(&NodeId::new("a"));
        assert!(VersionedValue::new(Bytes::new(), clock.clone()).is_tombstone());
        assert!(!VersionedValue::new(&b"v"[..], clock).is_tombstone());
    }
}
