//! Request handler that routes wire requests to the replica node.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use oolite_replica::{ReplicaError, ReplicaNode};
use oolite_wire::{ErrorCode, ErrorResponse, Request, Response};

/// Routes each [`Request`] to the matching replica operation and folds the
/// replica's error taxonomy into wire error responses.
pub struct Handler {
    node: Arc<ReplicaNode>,
}

impl Handler {
    pub fn new(node: Arc<ReplicaNode>) -> Self {
        Self { node }
    }

    /// Handles one request. Never fails: replica errors become
    /// [`Response::Error`] values so the connection stays usable.
    pub fn handle(&self, request: Request) -> Response {
        debug!(node = %self.node.id(), ?request, "handling request");
        match request {
            Request::Identity => Response::Identity {
                id: self.node.id().clone(),
            },
            Request::SetPreferenceList { peers } => {
                ack(self.node.set_preference_list(peers))
            }
            Request::Put {
                key,
                value,
                context,
            } => match self.node.put(&key, value, context) {
                Ok(clock) => Response::Put { clock },
                Err(error) => fail(error),
            },
            Request::Get { key } => match self.node.get(&key) {
                Ok(versions) => Response::Get { versions },
                Err(error) => fail(error),
            },
            Request::LocalWrite { key, entry } => ack(self.node.local_write(&key, entry)),
            Request::LocalRead { key } => match self.node.local_read(&key) {
                Ok(versions) => Response::LocalRead { versions },
                Err(error) => fail(error),
            },
            Request::TriggerGossip => ack(self.node.trigger_gossip()),
            Request::Crash { seconds } => ack(self.node.crash(Duration::from_secs(seconds))),
        }
    }
}

fn ack(result: oolite_replica::Result<()>) -> Response {
    match result {
        Ok(()) => Response::Ack,
        Err(error) => fail(error),
    }
}

fn fail(error: ReplicaError) -> Response {
    warn!(%error, "request failed");
    let message = error.to_string();
    match error {
        ReplicaError::Unavailable => Response::error(ErrorCode::Unavailable, message),
        ReplicaError::AlreadyCrashed => Response::error(ErrorCode::AlreadyCrashed, message),
        ReplicaError::StaleContext => Response::error(ErrorCode::StaleContext, message),
        ReplicaError::WriteQuorumNotMet { .. } => {
            Response::error(ErrorCode::WriteQuorumNotMet, message)
        }
        ReplicaError::ReadQuorumNotMet { gathered, .. } => Response::Error(ErrorResponse {
            code: ErrorCode::ReadQuorumNotMet,
            message,
            gathered,
        }),
    }
}
