//! Origin client for the TCP path.
//!
//! # Responsibilities
//! - Open a fresh connection to the origin per request (no pooling)
//! - Forward the request bytes verbatim and collect the full response
//! - Classify failures so the listener can substitute a synthetic response
//!
//! # Design Decisions
//! - Connection-close framing: reads until the origin closes or the socket
//!   timeout elapses, concatenating chunks into one buffer
//! - A read timeout before any byte arrived is a gateway timeout; a timeout
//!   after data arrived just ends the response (slow origin, no length
//!   framing to rely on)

use std::io;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Synthetic response for an origin that refused the connection or failed in
/// an unclassified way.
pub const BAD_GATEWAY_RESPONSE: &[u8] =
    b"HTTP/1.1 502 Bad Gateway\r\nContent-Type: text/plain\r\n\r\n502 Bad Gateway";

/// Synthetic response for an origin that timed out on connect or first read.
pub const GATEWAY_TIMEOUT_RESPONSE: &[u8] =
    b"HTTP/1.1 504 Gateway Timeout\r\nContent-Type: text/plain\r\n\r\n504 Gateway Timeout";

const READ_CHUNK_BYTES: usize = 4096;

/// Why a forward attempt failed.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Origin did not connect or did not send a first byte in time.
    #[error("origin timed out")]
    Timeout,

    /// Origin actively refused the connection.
    #[error("origin refused the connection")]
    Refused,

    /// Any other transport failure. Client-visible behavior is identical to
    /// `Refused` (502); the distinction exists only for logs.
    #[error("forwarding failed: {0}")]
    Other(#[from] io::Error),
}

impl ForwardError {
    /// The proxy-generated response substituted for this failure.
    pub fn synthetic_response(&self) -> &'static [u8] {
        match self {
            ForwardError::Timeout => GATEWAY_TIMEOUT_RESPONSE,
            ForwardError::Refused | ForwardError::Other(_) => BAD_GATEWAY_RESPONSE,
        }
    }
}

/// A successful origin round trip.
#[derive(Debug)]
pub struct ForwardReply {
    /// Complete raw response, captured verbatim.
    pub bytes: Vec<u8>,
    /// Time spent connecting, sending, and reading.
    pub elapsed: Duration,
}

/// Plain HTTP client toward the fixed origin address.
pub struct OriginClient {
    address: String,
    socket_timeout: Duration,
}

impl OriginClient {
    pub fn new(address: String, socket_timeout: Duration) -> Self {
        Self {
            address,
            socket_timeout,
        }
    }

    /// The origin address, for logging.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Forward one request and collect the origin's complete response.
    pub async fn forward(&self, request: &[u8]) -> Result<ForwardReply, ForwardError> {
        let start = Instant::now();

        let mut stream = match timeout(self.socket_timeout, TcpStream::connect(&self.address)).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => {
                return Err(ForwardError::Refused)
            }
            Ok(Err(e)) => return Err(ForwardError::Other(e)),
            Err(_) => return Err(ForwardError::Timeout),
        };

        match timeout(self.socket_timeout, stream.write_all(request)).await {
            Ok(write) => write?,
            Err(_) => return Err(ForwardError::Timeout),
        }

        let mut response = Vec::new();
        let mut chunk = [0u8; READ_CHUNK_BYTES];
        loop {
            match timeout(self.socket_timeout, stream.read(&mut chunk)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => response.extend_from_slice(&chunk[..n]),
                Ok(Err(e)) => {
                    if response.is_empty() {
                        return Err(ForwardError::Other(e));
                    }
                    break;
                }
                Err(_) => {
                    if response.is_empty() {
                        return Err(ForwardError::Timeout);
                    }
                    break;
                }
            }
        }

        Ok(ForwardReply {
            bytes: response,
            elapsed: start.elapsed(),
        })
    }
}
