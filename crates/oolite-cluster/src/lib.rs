//! In-process cluster harness: N replica nodes, each behind a real TCP
//! server on an OS-assigned port, wired together through the TCP dialer.
//!
//! Exercises the full stack — coordinator fan-out, the wire protocol, and
//! the server loop — without any external process management. Integration
//! suites and local development both boot clusters through
//! [`ClusterBuilder`].

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use oolite_client::{Client, ClientError, TcpDialer};
use oolite_replica::{NodeConfig, ReplicaError, ReplicaNode};
use oolite_server::{Server, ServerError, ServerHandle};
use oolite_types::{InvalidQuorum, NodeAddress, NodeId, QuorumParams};

/// Failure booting or addressing a test cluster.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Quorum(#[from] InvalidQuorum),

    #[error("replica error: {0}")]
    Replica(#[from] ReplicaError),

    #[error("server error: {0}")]
    Server(#[from] ServerError),

    #[error("client error: {0}")]
    Client(#[from] ClientError),

    #[error("no member at index {0}")]
    NoSuchMember(usize),
}

/// Builder for a [`TestCluster`].
pub struct ClusterBuilder {
    nodes: usize,
    write: usize,
    read: usize,
    dial_timeout: Duration,
}

impl ClusterBuilder {
    /// A cluster of `nodes` members with W = R = 1.
    pub fn new(nodes: usize) -> Self {
        Self {
            nodes,
            write: 1,
            read: 1,
            dial_timeout: Duration::from_secs(2),
        }
    }

    /// Sets the write and read quorum sizes (coordinator included).
    pub fn quorum(mut self, write: usize, read: usize) -> Self {
        self.write = write;
        self.read = read;
        self
    }

    /// Sets the peer dial timeout used for replica-to-replica traffic.
    pub fn dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    /// Boots every member and distributes the shared preference list.
    pub fn start(self) -> Result<TestCluster, ClusterError> {
        let quorum = QuorumParams::new(self.write, self.read)?;

        // Reserve all ports first so every node's config carries its real
        // address and the full preference list is known before serving.
        let mut listeners = Vec::with_capacity(self.nodes);
        let mut addresses = Vec::with_capacity(self.nodes);
        for _ in 0..self.nodes {
            let listener = TcpListener::bind("127.0.0.1:0")?;
            let local = listener.local_addr()?;
            addresses.push(NodeAddress::new(local.ip().to_string(), local.port()));
            listeners.push(listener);
        }

        let mut members = Vec::with_capacity(self.nodes);
        for (index, listener) in listeners.into_iter().enumerate() {
            let id = NodeId::new(format!("n{index}"));
            let config = NodeConfig {
                id: id.clone(),
                address: addresses[index].clone(),
                quorum,
            };
            let node = Arc::new(ReplicaNode::new(
                config,
                Arc::new(TcpDialer::new(self.dial_timeout)),
            ));
            node.set_preference_list(addresses.clone())?;
            let handle = Server::from_listener(Arc::clone(&node), listener)?.spawn();
            info!(%id, address = %addresses[index], "member serving");
            members.push(Member { id, handle });
        }

        Ok(TestCluster { members })
    }
}

struct Member {
    id: NodeId,
    handle: ServerHandle,
}

/// A running in-process cluster. Servers shut down when it drops.
pub struct TestCluster {
    members: Vec<Member>,
}

impl TestCluster {
    /// Boots a cluster; shorthand for the builder.
    pub fn start(nodes: usize, write: usize, read: usize) -> Result<Self, ClusterError> {
        ClusterBuilder::new(nodes).quorum(write, read).start()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Identity token of the member at `index`.
    pub fn id(&self, index: usize) -> Result<&NodeId, ClusterError> {
        self.members
            .get(index)
            .map(|member| &member.id)
            .ok_or(ClusterError::NoSuchMember(index))
    }

    /// Serving address of the member at `index`.
    pub fn address(&self, index: usize) -> Result<&NodeAddress, ClusterError> {
        self.members
            .get(index)
            .map(|member| member.handle.address())
            .ok_or(ClusterError::NoSuchMember(index))
    }

    /// All serving addresses in preference-list order.
    pub fn addresses(&self) -> Vec<NodeAddress> {
        self.members
            .iter()
            .map(|member| member.handle.address().clone())
            .collect()
    }

    /// Opens a fresh client connection to the member at `index`.
    pub fn client(&self, index: usize) -> Result<Client, ClusterError> {
        Ok(Client::connect(self.address(index)?)?)
    }
}
