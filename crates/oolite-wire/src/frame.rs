//! Length-prefixed framing over byte buffers.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::WireError;

/// Size of the frame header: a `u32` little-endian payload length.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Maximum accepted payload size. Anything larger is a protocol violation.
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// One wire frame: an opaque payload with its length prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub payload: Bytes,
}

impl Frame {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Appends the encoded frame to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(FRAME_HEADER_SIZE + self.payload.len());
        buf.put_u32_le(u32::try_from(self.payload.len()).unwrap_or(u32::MAX));
        buf.put_slice(&self.payload);
    }

    /// Attempts to decode one frame from the front of `buf`.
    ///
    /// Returns `Ok(None)` until a complete frame is buffered; consumes the
    /// frame's bytes on success. An oversized length prefix fails fast
    /// without waiting for the (bogus) payload to arrive.
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Self>, WireError> {
        if buf.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        let size = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        if size > MAX_FRAME_SIZE {
            return Err(WireError::FrameTooLarge {
                size,
                max: MAX_FRAME_SIZE,
            });
        }
        if buf.len() < FRAME_HEADER_SIZE + size {
            return Ok(None);
        }

        buf.advance(FRAME_HEADER_SIZE);
        let payload = buf.split_to(size).freeze();
        Ok(Some(Self { payload }))
    }
}
