//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): TCP requests by cache outcome
//! - `proxy_request_duration_seconds` (histogram): per-connection latency
//! - `proxy_bytes_in_total` / `proxy_bytes_out_total` (counters)
//! - `proxy_udp_packets_total` (counter): datagrams by outcome
//! - `proxy_cache_entries` (gauge): current cache size
//!
//! # Design Decisions
//! - Metric updates are cheap atomic operations behind the `metrics` facade
//! - The Prometheus exporter is optional and config-gated; without it the
//!   recorder calls are no-ops

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics endpoint"),
    }
}

/// Record one completed TCP transaction.
pub fn record_tcp_request(
    cache_status: &'static str,
    request_bytes: usize,
    response_bytes: usize,
    elapsed: Duration,
) {
    counter!("proxy_requests_total", "cache" => cache_status).increment(1);
    histogram!("proxy_request_duration_seconds", "cache" => cache_status)
        .record(elapsed.as_secs_f64());
    counter!("proxy_bytes_in_total").increment(request_bytes as u64);
    counter!("proxy_bytes_out_total").increment(response_bytes as u64);
}

/// Record one UDP datagram outcome ("forwarded" or "failed").
pub fn record_udp_packet(outcome: &'static str) {
    counter!("proxy_udp_packets_total", "outcome" => outcome).increment(1);
}

/// Record the current cache entry count.
pub fn record_cache_size(count: usize) {
    gauge!("proxy_cache_entries").set(count as f64);
}
