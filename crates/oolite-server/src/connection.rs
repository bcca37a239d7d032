//! One accepted TCP connection: a blocking read / decode / handle / write
//! loop over length-prefixed frames.

use std::io::{Read, Write};
use std::net::TcpStream;

use bytes::BytesMut;
use tracing::{debug, warn};

use oolite_wire::{Frame, Request, Response, write_message};

use crate::error::ServerError;
use crate::handler::Handler;

const READ_CHUNK: usize = 8 * 1024;

/// Serves requests on `stream` until the client disconnects.
///
/// A malformed request body gets an error response and closes the
/// connection; request/response matching is by order on the stream, so
/// there is no way to resynchronize after garbage.
pub(crate) fn serve(mut stream: TcpStream, handler: &Handler) -> Result<(), ServerError> {
    let mut read_buf = BytesMut::with_capacity(READ_CHUNK);
    let mut write_buf = BytesMut::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        while let Some(frame) = Frame::decode(&mut read_buf)? {
            let response = match Request::from_frame(&frame) {
                Ok(request) => handler.handle(request),
                Err(error) => {
                    warn!(%error, "undecodable request, closing connection");
                    let response = Response::error(
                        oolite_wire::ErrorCode::Internal,
                        format!("undecodable request: {error}"),
                    );
                    write_buf.clear();
                    write_message(&response, &mut write_buf)?;
                    stream.write_all(&write_buf)?;
                    return Ok(());
                }
            };
            write_buf.clear();
            write_message(&response, &mut write_buf)?;
            stream.write_all(&write_buf)?;
        }

        let n = stream.read(&mut chunk)?;
        if n == 0 {
            debug!("client disconnected");
            return Ok(());
        }
        read_buf.extend_from_slice(&chunk[..n]);
    }
}
