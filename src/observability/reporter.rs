//! Periodic stats reporting.
//!
//! # Responsibilities
//! - Snapshot both counter sets and the cache on a fixed interval
//! - Emit one structured report event per interval
//!
//! Purely observational: the reporter never mutates proxy state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::cache::HttpCache;
use crate::observability::metrics;
use crate::proxy::stats::{ProxyStats, UdpStats};

pub struct StatsReporter {
    tcp: Arc<ProxyStats>,
    udp: Arc<UdpStats>,
    cache: Arc<HttpCache>,
    interval: Duration,
}

impl StatsReporter {
    pub fn new(
        tcp: Arc<ProxyStats>,
        udp: Arc<UdpStats>,
        cache: Arc<HttpCache>,
        interval: Duration,
    ) -> Self {
        Self {
            tcp,
            udp,
            cache,
            interval,
        }
    }

    /// Report on every tick until the shutdown signal fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval(self.interval);
        // The first tick completes immediately; skip it so reports start one
        // full interval after startup.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.report();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Stats reporter received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    fn report(&self) {
        let tcp = self.tcp.snapshot();
        let udp = self.udp.snapshot();
        let cache = self.cache.snapshot();

        metrics::record_cache_size(cache.count);

        let cached_paths = serde_json::to_string(&cache.paths).unwrap_or_default();
        tracing::info!(
            total_requests = tcp.total_requests,
            cache_hits = tcp.cache_hits,
            cache_misses = tcp.cache_misses,
            gateway_errors = tcp.gateway_errors,
            timeout_errors = tcp.timeout_errors,
            total_packets = udp.total_packets,
            forwarded_packets = udp.forwarded_packets,
            failed_packets = udp.failed_packets,
            cached_responses = cache.count,
            cached_paths = %cached_paths,
            "Proxy statistics"
        );
    }
}
