//! Dual-protocol caching forward proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌───────────────────────────────────────────────┐
//!                   │                FORWARD PROXY                  │
//!                   │                                               │
//!   HTTP request    │  ┌─────────┐   ┌────────┐   ┌─────────────┐  │
//!   ────────────────┼─▶│  tcp    │──▶│ cache  │──▶│   origin    │──┼──▶ Origin
//!                   │  │listener │   │ lookup │   │   client    │  │    (HTTP)
//!   HTTP response   │  └─────────┘   └────────┘   └─────────────┘  │
//!   ◀───────────────┼───── cached bytes / relayed bytes / 502/504  │
//!                   │                                               │
//!   UDP datagram    │  ┌─────────┐        ┌─────────────────────┐  │
//!   ────────────────┼─▶│  udp    │───────▶│  ephemeral socket   │──┼──▶ Origin
//!   UDP reply/loss  │  │listener │        │  round trip         │  │    (echo)
//!   ◀───────────────┼──└─────────┘        └─────────────────────┘  │
//!                   │                                               │
//!                   │  ┌─────────────────────────────────────────┐  │
//!                   │  │ config │ stats │ observability │ shutdown│  │
//!                   │  └─────────────────────────────────────────┘  │
//!                   └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::{TcpListener, UdpSocket};

use forward_proxy::cache::HttpCache;
use forward_proxy::config::{load_config, ProxyConfig};
use forward_proxy::lifecycle::Shutdown;
use forward_proxy::observability::{logging, metrics, StatsReporter};
use forward_proxy::proxy::{ProxyStats, TcpProxy, UdpProxy, UdpStats};

/// How long shutdown waits for the TCP accept loop to drain.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "forward-proxy")]
#[command(about = "Dual-protocol caching forward proxy", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);

    tracing::info!("forward-proxy v0.1.0 starting");
    tracing::info!(
        tcp_bind = %config.tcp.bind_address,
        udp_bind = %config.udp.bind_address,
        origin_tcp = %config.origin.tcp_address,
        origin_udp = %config.origin.udp_address,
        socket_timeout_secs = config.timeouts.socket_secs,
        report_interval_secs = config.stats.report_interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Shared state: the cache and both counter sets, injected into listeners.
    let cache = Arc::new(HttpCache::new());
    let tcp_stats = Arc::new(ProxyStats::new());
    let udp_stats = Arc::new(UdpStats::new());
    let shutdown = Shutdown::new();

    // Bind up front so startup fails fast on an occupied port.
    let tcp_listener = TcpListener::bind(&config.tcp.bind_address).await?;
    let udp_socket = UdpSocket::bind(&config.udp.bind_address).await?;

    let tcp_proxy = TcpProxy::new(&config, Arc::clone(&cache), Arc::clone(&tcp_stats));
    let tcp_task = tokio::spawn(tcp_proxy.run(tcp_listener, shutdown.subscribe()));

    let udp_proxy = UdpProxy::new(&config, Arc::clone(&udp_stats));
    let udp_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        if let Err(e) = udp_proxy.run(udp_socket, udp_shutdown).await {
            tracing::error!(error = %e, "UDP proxy failed");
        }
    });

    let reporter = StatsReporter::new(
        Arc::clone(&tcp_stats),
        Arc::clone(&udp_stats),
        Arc::clone(&cache),
        config.stats.report_interval(),
    );
    tokio::spawn(reporter.run(shutdown.subscribe()));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    shutdown.trigger();

    // Bounded join of the TCP accept loop only; other tasks exit on their
    // own signal receivers.
    match tokio::time::timeout(SHUTDOWN_GRACE, tcp_task).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "HTTP proxy exited with error"),
        Ok(Err(e)) => tracing::error!(error = %e, "HTTP proxy task panicked"),
        Err(_) => tracing::warn!("HTTP proxy did not stop within the shutdown grace period"),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
