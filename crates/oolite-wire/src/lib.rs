//! # oolite-wire: the Oolite binary wire protocol
//!
//! Requests and responses are postcard-encoded enums carried in
//! length-prefixed frames: a 4-byte little-endian payload length followed by
//! the payload. Framing is incremental ([`Frame::decode`] returns `None`
//! until a whole frame is buffered) so connections can feed it straight from
//! partial reads.

mod frame;
mod message;

pub use frame::{FRAME_HEADER_SIZE, Frame, MAX_FRAME_SIZE};
pub use message::{ErrorCode, ErrorResponse, Request, Response, write_message};

use thiserror::Error;

/// Wire protocol errors.
#[derive(Debug, Error)]
pub enum WireError {
    /// Frame length prefix exceeds the protocol maximum.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// Message could not be encoded.
    #[error("encode error: {0}")]
    Encode(postcard::Error),

    /// Frame payload could not be decoded as a message.
    #[error("decode error: {0}")]
    Decode(postcard::Error),
}
