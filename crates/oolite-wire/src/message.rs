//! Request and response messages: the remote-call surface of a replica.

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use oolite_types::{NodeAddress, NodeId, VersionVector, VersionedValue};

use crate::{Frame, WireError};

/// One remote operation invoked on a replica.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    /// Resolve the node's identity token. Always answered, even while crashed.
    Identity,

    /// Replace the node's view of the cluster.
    SetPreferenceList { peers: Vec<NodeAddress> },

    /// Coordinator entry point: quorum write.
    Put {
        key: String,
        value: Bytes,
        context: VersionVector,
    },

    /// Coordinator entry point: quorum read.
    Get { key: String },

    /// Replication primitive: apply one revision locally (replica write or
    /// gossip push). No fan-out.
    LocalWrite { key: String, entry: VersionedValue },

    /// Replication primitive: the node's full local version set for a key.
    LocalRead { key: String },

    /// Drain the pending-repair ledger.
    TriggerGossip,

    /// Simulate an outage for the given number of seconds.
    Crash { seconds: u64 },
}

/// Reply to one [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    /// The node's identity token.
    Identity { id: NodeId },

    /// Plain acknowledgment (SetPreferenceList, LocalWrite, TriggerGossip, Crash).
    Ack,

    /// Successful Put: the clock stamped on the stored revision, for
    /// chaining causally dependent writes.
    Put { clock: VersionVector },

    /// Successful Get: the reduced multi-version result set. More than one
    /// entry is the conflict signal.
    Get { versions: Vec<VersionedValue> },

    /// LocalRead result; `None` if the key has never been written there.
    LocalRead { versions: Option<Vec<VersionedValue>> },

    /// The operation failed.
    Error(ErrorResponse),
}

/// Machine-readable failure taxonomy carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Node is in the crashed state.
    Unavailable,

    /// Crash control invoked on an already-crashed node.
    AlreadyCrashed,

    /// Write context is dominated by a newer local revision.
    StaleContext,

    /// Fewer than W-1 other replicas acknowledged the write.
    WriteQuorumNotMet,

    /// Fewer than R-1 other replicas answered the read.
    ReadQuorumNotMet,

    /// Malformed request or server-side fault.
    Internal,
}

/// A failed operation: code, human-readable detail, and — for degraded
/// reads — whatever versions were gathered before the quorum fell short.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default)]
    pub gathered: Vec<VersionedValue>,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unavailable => "unavailable",
            Self::AlreadyCrashed => "already-crashed",
            Self::StaleContext => "stale-context",
            Self::WriteQuorumNotMet => "write-quorum-not-met",
            Self::ReadQuorumNotMet => "read-quorum-not-met",
            Self::Internal => "internal",
        };
        write!(f, "{name}")
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl Response {
    /// Builds an error response with no gathered versions.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error(ErrorResponse {
            code,
            message: message.into(),
            gathered: Vec::new(),
        })
    }
}

impl Request {
    /// Encodes this request as a frame payload.
    pub fn to_frame(&self) -> Result<Frame, WireError> {
        encode(self)
    }

    /// Decodes a request from a frame payload.
    pub fn from_frame(frame: &Frame) -> Result<Self, WireError> {
        decode(frame)
    }
}

impl Response {
    /// Encodes this response as a frame payload.
    pub fn to_frame(&self) -> Result<Frame, WireError> {
        encode(self)
    }

    /// Decodes a response from a frame payload.
    pub fn from_frame(frame: &Frame) -> Result<Self, WireError> {
        decode(frame)
    }
}

fn encode<T: Serialize>(message: &T) -> Result<Frame, WireError> {
    let payload = postcard::to_allocvec(message).map_err(WireError::Encode)?;
    Ok(Frame::new(payload))
}

fn decode<T: for<'de> Deserialize<'de>>(frame: &Frame) -> Result<T, WireError> {
    postcard::from_bytes(&frame.payload).map_err(WireError::Decode)
}

/// Convenience: encode a message straight into a connection write buffer.
pub fn write_message<T: Serialize>(message: &T, buf: &mut BytesMut) -> Result<(), WireError> {
    encode(message)?.encode(buf);
    Ok(())
}
