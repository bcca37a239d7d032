//! Blocking TCP client for the oolite wire protocol.
//!
//! Two consumers share this crate. End users drive [`Client`] directly: one
//! typed method per remote operation, with server-side failures surfaced as
//! [`ClientError::Server`]. The replica core consumes [`TcpDialer`], which
//! adapts the same connection machinery to the peer seam it fans out over.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tracing::trace;

use oolite_replica::{Dialer, PeerError, PeerHandle};
use oolite_types::{NodeAddress, NodeId, VersionVector, VersionedValue};
use oolite_wire::{ErrorCode, ErrorResponse, Frame, Request, Response, WireError, write_message};

/// Default connect / read / write timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Failure of a client-side operation.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    #[error("address {0} did not resolve")]
    Unresolvable(NodeAddress),

    #[error("connection closed mid-response")]
    ConnectionClosed,

    /// The server executed the request and reported a failure.
    #[error("server error: {0}")]
    Server(ErrorResponse),

    /// The server answered with a response variant the operation does not
    /// produce. Only a version-skewed or buggy server gets here.
    #[error("unexpected response to {operation}")]
    UnexpectedResponse { operation: &'static str },
}

/// A blocking connection to one replica.
///
/// Not thread-safe by design: requests and responses are matched by order
/// on a single stream, so share a `Client` behind your own synchronization
/// or open one per thread.
pub struct Client {
    stream: TcpStream,
    read_buf: BytesMut,
    write_buf: BytesMut,
}

impl Client {
    /// Connects with [`DEFAULT_TIMEOUT`].
    pub fn connect(address: &NodeAddress) -> Result<Self, ClientError> {
        Self::connect_with_timeout(address, DEFAULT_TIMEOUT)
    }

    /// Connects with an explicit timeout, applied to the connect itself and
    /// to every subsequent read and write.
    pub fn connect_with_timeout(
        address: &NodeAddress,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let socket = resolve(address)?;
        let stream = TcpStream::connect_timeout(&socket, timeout)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        trace!(%address, "connected");
        Ok(Self {
            stream,
            read_buf: BytesMut::with_capacity(4 * 1024),
            write_buf: BytesMut::with_capacity(4 * 1024),
        })
    }

    /// Asks the node for its identity token. Answered even while crashed.
    pub fn identity(&mut self) -> Result<NodeId, ClientError> {
        match self.call(&Request::Identity)? {
            Response::Identity { id } => Ok(id),
            other => unexpected("identity", &other),
        }
    }

    /// Replaces the node's preference list.
    pub fn set_preference_list(&mut self, peers: Vec<NodeAddress>) -> Result<(), ClientError> {
        match self.call(&Request::SetPreferenceList { peers })? {
            Response::Ack => Ok(()),
            other => unexpected("set_preference_list", &other),
        }
    }

    /// Quorum write coordinated by the connected node. Returns the clock
    /// stamped on the stored revision; pass it as `context` to chain a
    /// causally dependent write.
    pub fn put(
        &mut self,
        key: &str,
        value: impl Into<Bytes>,
        context: VersionVector,
    ) -> Result<VersionVector, ClientError> {
        let request = Request::Put {
            key: key.to_string(),
            value: value.into(),
            context,
        };
        match self.call(&request)? {
            Response::Put { clock } => Ok(clock),
            other => unexpected("put", &other),
        }
    }

    /// Quorum read coordinated by the connected node. More than one entry
    /// in the result is a conflict the caller must reconcile.
    pub fn get(&mut self, key: &str) -> Result<Vec<VersionedValue>, ClientError> {
        let request = Request::Get {
            key: key.to_string(),
        };
        match self.call(&request)? {
            Response::Get { versions } => Ok(versions),
            other => unexpected("get", &other),
        }
    }

    /// Applies one revision to the node's local version set, no fan-out.
    pub fn local_write(&mut self, key: &str, entry: &VersionedValue) -> Result<(), ClientError> {
        let request = Request::LocalWrite {
            key: key.to_string(),
            entry: entry.clone(),
        };
        match self.call(&request)? {
            Response::Ack => Ok(()),
            other => unexpected("local_write", &other),
        }
    }

    /// Reads the node's full local version set for `key`.
    pub fn local_read(&mut self, key: &str) -> Result<Option<Vec<VersionedValue>>, ClientError> {
        let request = Request::LocalRead {
            key: key.to_string(),
        };
        match self.call(&request)? {
            Response::LocalRead { versions } => Ok(versions),
            other => unexpected("local_read", &other),
        }
    }

    /// Tells the node to drain its pending-repair ledger now.
    pub fn trigger_gossip(&mut self) -> Result<(), ClientError> {
        match self.call(&Request::TriggerGossip)? {
            Response::Ack => Ok(()),
            other => unexpected("trigger_gossip", &other),
        }
    }

    /// Simulates an outage on the node for `seconds`.
    pub fn crash(&mut self, seconds: u64) -> Result<(), ClientError> {
        match self.call(&Request::Crash { seconds })? {
            Response::Ack => Ok(()),
            other => unexpected("crash", &other),
        }
    }

    /// Sends one request and blocks for its response.
    fn call(&mut self, request: &Request) -> Result<Response, ClientError> {
        self.write_buf.clear();
        write_message(request, &mut self.write_buf)?;
        self.stream.write_all(&self.write_buf)?;

        let frame = self.read_frame()?;
        Ok(Response::from_frame(&frame)?)
    }

    fn read_frame(&mut self) -> Result<Frame, ClientError> {
        let mut chunk = [0u8; 4 * 1024];
        loop {
            if let Some(frame) = Frame::decode(&mut self.read_buf)? {
                return Ok(frame);
            }
            let n = self.stream.read(&mut chunk)?;
            if n == 0 {
                return Err(ClientError::ConnectionClosed);
            }
            self.read_buf.extend_from_slice(&chunk[..n]);
        }
    }
}

fn resolve(address: &NodeAddress) -> Result<SocketAddr, ClientError> {
    address
        .to_string()
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| ClientError::Unresolvable(address.clone()))
}

fn unexpected<T>(operation: &'static str, response: &Response) -> Result<T, ClientError> {
    if let Response::Error(error) = response {
        return Err(ClientError::Server(error.clone()));
    }
    Err(ClientError::UnexpectedResponse { operation })
}

/// TCP implementation of the replica core's peer seam.
///
/// One dial per coordinator walk, one connection per handle. The error
/// mapping is what gives the coordinator its crashed-versus-unreachable
/// distinction: a node that answers with `Unavailable` was reached.
pub struct TcpDialer {
    timeout: Duration,
}

impl TcpDialer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TcpDialer {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Dialer for TcpDialer {
    fn dial(&self, address: &NodeAddress) -> Result<Box<dyn PeerHandle>, PeerError> {
        let client = Client::connect_with_timeout(address, self.timeout)
            .map_err(|error| PeerError::Unreachable(error.to_string()))?;
        Ok(Box::new(TcpPeer { client }))
    }
}

struct TcpPeer {
    client: Client,
}

impl PeerHandle for TcpPeer {
    fn identity(&mut self) -> Result<NodeId, PeerError> {
        self.client.identity().map_err(into_peer_error)
    }

    fn local_write(&mut self, key: &str, entry: &VersionedValue) -> Result<(), PeerError> {
        self.client
            .local_write(key, entry)
            .map_err(into_peer_error)
    }

    fn local_read(&mut self, key: &str) -> Result<Option<Vec<VersionedValue>>, PeerError> {
        self.client.local_read(key).map_err(into_peer_error)
    }
}

fn into_peer_error(error: ClientError) -> PeerError {
    match error {
        ClientError::Server(ref response) if response.code == ErrorCode::Unavailable => {
            PeerError::Unavailable
        }
        ClientError::Io(_) | ClientError::ConnectionClosed | ClientError::Unresolvable(_) => {
            PeerError::Unreachable(error.to_string())
        }
        ClientError::Wire(_) | ClientError::Server(_) | ClientError::UnexpectedResponse { .. } => {
            PeerError::Protocol(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_server_error_maps_to_peer_unavailable() {
        let error = ClientError::Server(ErrorResponse {
            code: ErrorCode::Unavailable,
            message: "node crashed".to_string(),
            gathered: Vec::new(),
        });
        assert!(matches!(into_peer_error(error), PeerError::Unavailable));
    }

    #[test]
    fn io_failures_map_to_peer_unreachable() {
        let error = ClientError::Io(std::io::Error::from(std::io::ErrorKind::ConnectionRefused));
        assert!(matches!(into_peer_error(error), PeerError::Unreachable(_)));
    }

    #[test]
    fn other_server_errors_map_to_peer_protocol() {
        let error = ClientError::Server(ErrorResponse {
            code: ErrorCode::StaleContext,
            message: "dominated".to_string(),
            gathered: Vec::new(),
        });
        assert!(matches!(into_peer_error(error), PeerError::Protocol(_)));
    }
}
