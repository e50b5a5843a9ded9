use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, timeout_at};

use crate::http::parser::{ParseError, parse_http_request};
use crate::http::request::Request;
use crate::http::writer::ResponseWriter;
use crate::routes::Router;

const READ_CHUNK: usize = 4096;

/// Drives one accepted socket through request/response cycles.
///
/// The connection owns its input buffer outright. Requests are handled one
/// at a time in arrival order; bytes left over after a request stay in the
/// buffer and are parsed before the socket is read again.
pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    state: ConnectionState,
    router: Router,
    read_timeout: Option<Duration>,
}

pub enum ConnectionState {
    Reading,
    Dispatching(Request),
    Writing(ResponseWriter, bool), // bool = close after this response
    Closing,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, router: Router, read_timeout: Option<Duration>) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            state: ConnectionState::Reading,
            router,
            read_timeout,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => match self.read_request().await {
                    Some(req) => {
                        self.state = ConnectionState::Dispatching(req);
                    }
                    None => {
                        self.state = ConnectionState::Closing;
                    }
                },

                ConnectionState::Dispatching(req) => {
                    let close = !req.keep_alive();
                    let response = self.router.dispatch(req).await;

                    let writer = ResponseWriter::new(&response, close);
                    self.state = ConnectionState::Writing(writer, close);
                }

                ConnectionState::Writing(writer, close) => {
                    writer.write_to_stream(&mut self.stream).await?;

                    if *close {
                        self.state = ConnectionState::Closing;
                    } else {
                        self.state = ConnectionState::Reading; // next request, possibly already buffered
                    }
                }

                ConnectionState::Closing => {
                    // The peer may already be gone
                    let _ = self.stream.shutdown().await;
                    break;
                }
            }
        }

        Ok(())
    }

    /// Returns the next complete request, or `None` once the connection
    /// should close: peer hung up, read failed or timed out, or the bytes
    /// received are not a valid request.
    ///
    /// The read timeout bounds the idle wait for a request's first byte and,
    /// separately, the whole time from that byte to the complete request.
    pub async fn read_request(&mut self) -> Option<Request> {
        let mut deadline = self.read_timeout.map(|limit| Instant::now() + limit);
        let mut started = !self.buffer.is_empty();

        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    self.buffer.advance(consumed);
                    return Some(request);
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(e) => {
                    tracing::warn!(error = %e, "Malformed request, closing connection");
                    return None;
                }
            }

            self.buffer.reserve(READ_CHUNK);
            let read = self.stream.read_buf(&mut self.buffer);
            let result = match deadline {
                Some(at) => match timeout_at(at, read).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::debug!(
                            pending = self.buffer.len(),
                            "Read timed out, closing connection"
                        );
                        return None;
                    }
                },
                None => read.await,
            };

            match result {
                Ok(0) => {
                    if !self.buffer.is_empty() {
                        tracing::debug!(
                            pending = self.buffer.len(),
                            "Peer closed with a partial request buffered"
                        );
                    }
                    return None;
                }
                Ok(_) => {
                    if !started {
                        // First byte of this request: its clock starts now
                        started = true;
                        deadline = self.read_timeout.map(|limit| Instant::now() + limit);
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Read failed, closing connection");
                    return None;
                }
            }
        }
    }
}
