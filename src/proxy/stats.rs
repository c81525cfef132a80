//! Shared request/packet counters.
//!
//! # Responsibilities
//! - Count TCP requests, cache outcomes, and forwarding errors
//! - Count UDP packets by outcome
//! - Produce consistent snapshots for the stats reporter
//!
//! # Design Decisions
//! - Plain atomic counters; relaxed ordering is enough since each counter is
//!   independent and only ever summed for reporting
//! - Counters are monotonic for the process lifetime, reset only by restart

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters maintained by the TCP proxy listener.
#[derive(Debug, Default)]
pub struct ProxyStats {
    total_requests: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    gateway_errors: AtomicU64,
    timeout_errors: AtomicU64,
}

/// Point-in-time copy of [`ProxyStats`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProxyStatsSnapshot {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub gateway_errors: u64,
    pub timeout_errors: u64,
}

impl ProxyStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one accepted request (incremented once per connection, after the
    /// request line is parsed).
    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Count an origin connect failure (surfaced to the client as 502).
    pub fn record_gateway_error(&self) {
        self.gateway_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Count an origin timeout (surfaced to the client as 504).
    pub fn record_timeout_error(&self) {
        self.timeout_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProxyStatsSnapshot {
        ProxyStatsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            gateway_errors: self.gateway_errors.load(Ordering::Relaxed),
            timeout_errors: self.timeout_errors.load(Ordering::Relaxed),
        }
    }
}

/// Counters maintained by the UDP proxy listener.
#[derive(Debug, Default)]
pub struct UdpStats {
    total_packets: AtomicU64,
    forwarded_packets: AtomicU64,
    failed_packets: AtomicU64,
}

/// Point-in-time copy of [`UdpStats`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct UdpStatsSnapshot {
    pub total_packets: u64,
    pub forwarded_packets: u64,
    pub failed_packets: u64,
}

impl UdpStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_packet(&self) {
        self.total_packets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_forwarded(&self) {
        self.forwarded_packets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed_packets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> UdpStatsSnapshot {
        UdpStatsSnapshot {
            total_packets: self.total_packets.load(Ordering::Relaxed),
            forwarded_packets: self.forwarded_packets.load(Ordering::Relaxed),
            failed_packets: self.failed_packets.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_proxy_stats_counts() {
        let stats = ProxyStats::new();
        stats.record_request();
        stats.record_request();
        stats.record_hit();
        stats.record_miss();
        stats.record_gateway_error();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_requests, 2);
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.gateway_errors, 1);
        assert_eq!(snapshot.timeout_errors, 0);
    }

    #[test]
    fn test_udp_stats_counts() {
        let stats = UdpStats::new();
        stats.record_packet();
        stats.record_forwarded();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_packets, 1);
        assert_eq!(snapshot.forwarded_packets, 1);
        assert_eq!(snapshot.failed_packets, 0);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let stats = Arc::new(ProxyStats::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let stats = Arc::clone(&stats);
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    stats.record_request();
                    stats.record_miss();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_requests, 8000);
        assert_eq!(snapshot.cache_misses, 8000);
    }
}
