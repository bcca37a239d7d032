//! In-memory cluster harness: replica nodes wired to each other through a
//! registry-backed dialer, with per-address partitioning to simulate
//! unreachable peers.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use oolite_replica::{
    Dialer, NodeAddress, NodeConfig, NodeId, PeerError, PeerHandle, QuorumParams, ReplicaNode,
    VersionedValue,
};

type Registry = Arc<RwLock<HashMap<NodeAddress, Arc<ReplicaNode>>>>;
type Partitions = Arc<RwLock<HashSet<NodeAddress>>>;

pub struct MemoryCluster {
    nodes: Vec<Arc<ReplicaNode>>,
    addresses: Vec<NodeAddress>,
    partitioned: Partitions,
}

impl MemoryCluster {
    /// Boots `count` nodes, each seeing the full address list (itself
    /// included) as its preference list.
    pub fn new(count: usize, write: usize, read: usize) -> Self {
        let registry: Registry = Arc::new(RwLock::new(HashMap::new()));
        let partitioned: Partitions = Arc::new(RwLock::new(HashSet::new()));
        let dialer = Arc::new(MemoryDialer {
            registry: registry.clone(),
            partitioned: partitioned.clone(),
        });

        let addresses: Vec<_> = (0..count)
            .map(|i| NodeAddress::new("127.0.0.1", 7000 + u16::try_from(i).unwrap()))
            .collect();

        let mut nodes = Vec::with_capacity(count);
        for (i, address) in addresses.iter().enumerate() {
            let node = Arc::new(ReplicaNode::new(
                NodeConfig {
                    id: NodeId::new(format!("n{i}")),
                    address: address.clone(),
                    quorum: QuorumParams::new(write, read).unwrap(),
                },
                dialer.clone(),
            ));
            registry.write().unwrap().insert(address.clone(), node.clone());
            nodes.push(node);
        }

        for node in &nodes {
            node.set_preference_list(addresses.clone()).unwrap();
        }

        Self {
            nodes,
            addresses,
            partitioned,
        }
    }

    pub fn node(&self, i: usize) -> &Arc<ReplicaNode> {
        &self.nodes[i]
    }

    /// Makes node `i` unreachable (dials fail outright).
    pub fn partition(&self, i: usize) {
        self.partitioned
            .write()
            .unwrap()
            .insert(self.addresses[i].clone());
    }

    /// Makes node `i` reachable again.
    pub fn heal(&self, i: usize) {
        self.partitioned.write().unwrap().remove(&self.addresses[i]);
    }

    /// Dials node `i` the way a coordinator would.
    pub fn dial(&self, i: usize) -> Result<Box<dyn PeerHandle>, PeerError> {
        MemoryDialer {
            registry: Arc::new(RwLock::new(
                self.addresses
                    .iter()
                    .cloned()
                    .zip(self.nodes.iter().cloned())
                    .collect(),
            )),
            partitioned: self.partitioned.clone(),
        }
        .dial(&self.addresses[i])
    }
}

struct MemoryDialer {
    registry: Registry,
    partitioned: Partitions,
}

impl Dialer for MemoryDialer {
    fn dial(&self, address: &NodeAddress) -> Result<Box<dyn PeerHandle>, PeerError> {
        if self.partitioned.read().unwrap().contains(address) {
            return Err(PeerError::Unreachable(format!("{address} partitioned")));
        }
        let node = self
            .registry
            .read()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or_else(|| PeerError::Unreachable(format!("{address} unknown")))?;
        Ok(Box::new(MemoryPeer { node }))
    }
}

struct MemoryPeer {
    node: Arc<ReplicaNode>,
}

impl PeerHandle for MemoryPeer {
    fn identity(&mut self) -> Result<NodeId, PeerError> {
        // Identity resolution succeeds even on crashed nodes.
        Ok(self.node.id().clone())
    }

    fn local_write(&mut self, key: &str, entry: &VersionedValue) -> Result<(), PeerError> {
        self.node
            .local_write(key, entry.clone())
            .map_err(|e| map_replica_error(&e))
    }

    fn local_read(&mut self, key: &str) -> Result<Option<Vec<VersionedValue>>, PeerError> {
        self.node.local_read(key).map_err(|e| map_replica_error(&e))
    }
}

fn map_replica_error(err: &oolite_replica::ReplicaError) -> PeerError {
    match err {
        oolite_replica::ReplicaError::Unavailable => PeerError::Unavailable,
        other => PeerError::Protocol(other.to_string()),
    }
}
