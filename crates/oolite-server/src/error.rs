//! Server-side error types.

use thiserror::Error;

use oolite_wire::WireError;

/// Failure at the listener or connection layer. Replica-level failures
/// never surface here; they become wire error responses instead.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wire error: {0}")]
    Wire(#[from] WireError),
}
