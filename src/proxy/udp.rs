//! UDP proxy listener for QoS test traffic.
//!
//! # Responsibilities
//! - Receive datagrams and dispatch each to its own forwarding task
//! - Relay exactly one origin reply per datagram back to the source
//! - Count packets by outcome
//!
//! # Design Decisions
//! - No cache on this path: QoS probes are unique, timestamped packets
//! - Failure means silence toward the client; the client measures that as
//!   packet loss, which is the point of the QoS test
//! - Each forward uses a fresh ephemeral socket so replies cannot be
//!   mis-attributed between concurrent probes

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tokio::time::timeout;

use crate::config::ProxyConfig;
use crate::observability::metrics;
use crate::proxy::stats::UdpStats;

/// Largest datagram the proxy will accept or relay.
pub const MAX_DATAGRAM_BYTES: usize = 65535;

/// Datagram relay toward the origin's UDP echo endpoint.
pub struct UdpProxy {
    stats: Arc<UdpStats>,
    origin_address: String,
    socket_timeout: Duration,
}

impl UdpProxy {
    pub fn new(config: &ProxyConfig, stats: Arc<UdpStats>) -> Self {
        Self {
            stats,
            origin_address: config.origin.udp_address.clone(),
            socket_timeout: config.timeouts.socket_timeout(),
        }
    }

    /// Run the receive loop until the shutdown signal fires.
    pub async fn run(
        self,
        socket: UdpSocket,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let local_addr = socket.local_addr()?;
        tracing::info!(
            address = %local_addr,
            origin = %self.origin_address,
            "UDP QoS proxy listening"
        );

        let socket = Arc::new(socket);
        let proxy = Arc::new(self);
        let mut buf = vec![0u8; MAX_DATAGRAM_BYTES];
        loop {
            tokio::select! {
                received = socket.recv_from(&mut buf) => {
                    match received {
                        Ok((n, peer)) => {
                            proxy.stats.record_packet();
                            let datagram = buf[..n].to_vec();
                            let proxy = Arc::clone(&proxy);
                            let socket = Arc::clone(&socket);
                            tokio::spawn(async move {
                                proxy.relay_datagram(socket, datagram, peer).await;
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to receive datagram");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("UDP proxy received shutdown signal, exiting receive loop");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Forward one datagram and relay the reply to the original source.
    /// On any failure the client hears nothing.
    async fn relay_datagram(&self, listener: Arc<UdpSocket>, datagram: Vec<u8>, peer: SocketAddr) {
        let start = Instant::now();

        let reply = match self.forward_datagram(&datagram).await {
            Ok(reply) => reply,
            Err(e) => {
                self.stats.record_failed();
                metrics::record_udp_packet("failed");
                tracing::warn!(
                    client = %peer,
                    destination = %self.origin_address,
                    error = %e,
                    "UDP forward failed"
                );
                return;
            }
        };

        if let Err(e) = listener.send_to(&reply, peer).await {
            self.stats.record_failed();
            metrics::record_udp_packet("failed");
            tracing::warn!(client = %peer, error = %e, "Failed to relay reply to client");
            return;
        }

        self.stats.record_forwarded();
        metrics::record_udp_packet("forwarded");

        let elapsed = start.elapsed();
        tracing::info!(
            protocol = "udp",
            client = %peer,
            destination = %self.origin_address,
            packet_bytes = datagram.len(),
            reply_bytes = reply.len(),
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "Transaction complete"
        );
    }

    /// One round trip over a fresh ephemeral socket: send the datagram, wait
    /// (bounded) for exactly one reply.
    async fn forward_datagram(&self, datagram: &[u8]) -> Result<Vec<u8>, io::Error> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.send_to(datagram, &self.origin_address).await?;

        let mut buf = vec![0u8; MAX_DATAGRAM_BYTES];
        let (n, _) = timeout(self.socket_timeout, socket.recv_from(&mut buf))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "no reply from origin"))??;
        buf.truncate(n);
        Ok(buf)
    }
}
