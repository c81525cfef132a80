//! TCP proxy listener.
//!
//! # Responsibilities
//! - Accept client connections and dispatch each to its own task
//! - Parse the request line for the cache key
//! - Serve cache hits locally, forward misses to the origin
//! - Emit one transaction event per connection
//!
//! # Design Decisions
//! - One read of up to 4096 bytes is treated as "the request"; test traffic
//!   is small GETs and the origin is the final arbiter of well-formedness
//! - A malformed request line is still forwarded best-effort (path = None)
//! - Handler failures are logged and contained; the accept loop never stops
//!   because of one bad connection

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::time::timeout;

use crate::cache::HttpCache;
use crate::config::ProxyConfig;
use crate::observability::metrics;
use crate::proxy::origin::{ForwardError, OriginClient};
use crate::proxy::stats::ProxyStats;

/// Upper bound on a single request read.
const MAX_REQUEST_BYTES: usize = 4096;

/// Cache outcome for one connection, as logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP forwarding proxy with a shared response cache.
pub struct TcpProxy {
    cache: Arc<HttpCache>,
    stats: Arc<ProxyStats>,
    origin: OriginClient,
    socket_timeout: Duration,
}

impl TcpProxy {
    pub fn new(config: &ProxyConfig, cache: Arc<HttpCache>, stats: Arc<ProxyStats>) -> Self {
        let socket_timeout = config.timeouts.socket_timeout();
        Self {
            cache,
            stats,
            origin: OriginClient::new(config.origin.tcp_address.clone(), socket_timeout),
            socket_timeout,
        }
    }

    /// Run the accept loop until the shutdown signal fires.
    ///
    /// Every accepted connection is handled in its own spawned task;
    /// in-flight handlers finish naturally after shutdown.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let local_addr = listener.local_addr()?;
        tracing::info!(
            address = %local_addr,
            origin = %self.origin.address(),
            "HTTP proxy listening"
        );

        let proxy = Arc::new(self);
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let proxy = Arc::clone(&proxy);
                            tokio::spawn(async move {
                                if let Err(e) = proxy.handle_connection(stream, peer).await {
                                    tracing::error!(client = %peer, error = %e, "Error handling client");
                                }
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("HTTP proxy received shutdown signal, exiting accept loop");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle one client connection end to end:
    /// receive -> parse -> cache lookup -> forward on miss -> respond -> log.
    async fn handle_connection(
        &self,
        mut stream: TcpStream,
        peer: SocketAddr,
    ) -> Result<(), io::Error> {
        let start = Instant::now();

        let mut buf = [0u8; MAX_REQUEST_BYTES];
        let n = match timeout(self.socket_timeout, stream.read(&mut buf)).await {
            Ok(read) => read?,
            Err(_) => {
                tracing::warn!(client = %peer, "Timed out waiting for request");
                return Ok(());
            }
        };
        if n == 0 {
            tracing::warn!(client = %peer, "Empty request received");
            return Ok(());
        }
        let request = &buf[..n];

        // A request that does not decode as UTF-8 cannot be parsed for a
        // path; log and close without counting it, matching the original
        // decode-then-handle order.
        if std::str::from_utf8(request).is_err() {
            tracing::warn!(client = %peer, bytes = n, "Request is not valid UTF-8");
            return Ok(());
        }

        let path = extract_path(request);
        self.stats.record_request();

        let (response, cache_status) = match self.cache.lookup(path.as_deref()) {
            Some(cached) => {
                self.stats.record_hit();
                (cached, CacheStatus::Hit)
            }
            None => {
                self.stats.record_miss();
                let bytes = match self.origin.forward(request).await {
                    Ok(reply) => {
                        tracing::debug!(
                            client = %peer,
                            origin = %self.origin.address(),
                            origin_ms = reply.elapsed.as_secs_f64() * 1000.0,
                            "Origin round trip complete"
                        );
                        reply.bytes
                    }
                    Err(err) => {
                        match err {
                            ForwardError::Timeout => self.stats.record_timeout_error(),
                            ForwardError::Refused | ForwardError::Other(_) => {
                                self.stats.record_gateway_error()
                            }
                        }
                        tracing::warn!(
                            client = %peer,
                            origin = %self.origin.address(),
                            error = %err,
                            "Forwarding to origin failed"
                        );
                        err.synthetic_response().to_vec()
                    }
                };
                self.cache.admit(path.as_deref(), &bytes);
                (bytes, CacheStatus::Miss)
            }
        };

        // The write is bounded too: a client that stops reading must not pin
        // this task (and its clone of the response) past the socket timeout.
        match timeout(self.socket_timeout, stream.write_all(&response)).await {
            Ok(write) => write?,
            Err(_) => {
                tracing::warn!(client = %peer, "Timed out writing response to client");
                return Ok(());
            }
        }

        let elapsed = start.elapsed();
        metrics::record_tcp_request(cache_status.as_str(), n, response.len(), elapsed);
        tracing::info!(
            protocol = "tcp",
            client = %peer,
            destination = %self.origin.address(),
            cache = %cache_status,
            request_bytes = n,
            response_bytes = response.len(),
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "Transaction complete"
        );

        Ok(())
    }
}

/// Extract the request path: second whitespace token of the first
/// CRLF-separated line. Returns `None` for anything that does not have one.
pub(crate) fn extract_path(request: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(request).ok()?;
    let request_line = text.split("\r\n").next()?;
    request_line
        .split_whitespace()
        .nth(1)
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_path_from_get() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example\r\n\r\n";
        assert_eq!(extract_path(request).as_deref(), Some("/index.html"));
    }

    #[test]
    fn test_extract_path_keeps_query_string() {
        let request = b"GET /page?id=1&x=2 HTTP/1.1\r\n\r\n";
        assert_eq!(extract_path(request).as_deref(), Some("/page?id=1&x=2"));
    }

    #[test]
    fn test_extract_path_missing_token() {
        assert_eq!(extract_path(b"GET\r\n\r\n"), None);
        assert_eq!(extract_path(b"\r\n\r\n"), None);
        assert_eq!(extract_path(b""), None);
    }

    #[test]
    fn test_extract_path_only_first_line() {
        let request = b"GET /a HTTP/1.1\r\nX-Fake: GET /b HTTP/1.1\r\n\r\n";
        assert_eq!(extract_path(request).as_deref(), Some("/a"));
    }

    #[test]
    fn test_cache_status_display() {
        assert_eq!(CacheStatus::Hit.to_string(), "HIT");
        assert_eq!(CacheStatus::Miss.to_string(), "MISS");
    }
}
