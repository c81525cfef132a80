//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};

use forward_proxy::cache::HttpCache;
use forward_proxy::config::ProxyConfig;
use forward_proxy::lifecycle::Shutdown;
use forward_proxy::proxy::{ProxyStats, TcpProxy, UdpProxy, UdpStats};

/// Build a config pointing at the given origin endpoints, with a short
/// socket timeout so failure tests finish quickly.
pub fn test_config(origin_tcp: SocketAddr, origin_udp: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.origin.tcp_address = origin_tcp.to_string();
    config.origin.udp_address = origin_udp.to_string();
    config.timeouts.socket_secs = 1;
    config
}

/// An address nothing listens on (bound, then released).
pub async fn unused_tcp_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Start a mock origin that answers every connection with a fixed raw
/// response and closes. Returns its address and a connection counter.
#[allow(dead_code)]
pub async fn start_mock_origin(response: &'static str) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&connections);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, connections)
}

/// Start an origin that accepts connections but never sends a byte.
#[allow(dead_code)]
pub async fn start_silent_origin() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        tokio::time::sleep(Duration::from_secs(60)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a UDP origin that echoes every datagram back to its sender.
#[allow(dead_code)]
pub async fn start_udp_echo() -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();

    tokio::spawn(async move {
        let mut buf = vec![0u8; 65536];
        loop {
            match socket.recv_from(&mut buf).await {
                Ok((n, from)) => {
                    let _ = socket.send_to(&buf[..n], from).await;
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start the TCP proxy against a fresh port. The returned `Shutdown` must be
/// kept alive for the proxy's lifetime.
#[allow(dead_code)]
pub async fn start_tcp_proxy(
    config: &ProxyConfig,
) -> (SocketAddr, Arc<HttpCache>, Arc<ProxyStats>, Shutdown) {
    let cache = Arc::new(HttpCache::new());
    let stats = Arc::new(ProxyStats::new());
    let shutdown = Shutdown::new();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let proxy = TcpProxy::new(config, Arc::clone(&cache), Arc::clone(&stats));
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = proxy.run(listener, rx).await;
    });

    (addr, cache, stats, shutdown)
}

/// Start the UDP proxy against a fresh port.
#[allow(dead_code)]
pub async fn start_udp_proxy(config: &ProxyConfig) -> (SocketAddr, Arc<UdpStats>, Shutdown) {
    let stats = Arc::new(UdpStats::new());
    let shutdown = Shutdown::new();

    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();

    let proxy = UdpProxy::new(config, Arc::clone(&stats));
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = proxy.run(socket, rx).await;
    });

    (addr, stats, shutdown)
}

/// Issue one GET through the proxy and collect the full response.
#[allow(dead_code)]
pub async fn http_get(proxy: SocketAddr, path: &str) -> Vec<u8> {
    let request = format!(
        "GET {path} HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n"
    );
    send_raw(proxy, request.as_bytes()).await
}

/// Send raw bytes to the proxy and collect everything until it closes.
#[allow(dead_code)]
pub async fn send_raw(proxy: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    response
}

/// Poll a condition until it holds or the deadline passes.
#[allow(dead_code)]
pub async fn wait_until<F: Fn() -> bool>(deadline: Duration, cond: F) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
