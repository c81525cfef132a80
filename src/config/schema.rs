//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files, and
//! every section has defaults matching the original deployment constants so
//! a missing or partial file still runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the forwarding proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// TCP listener settings.
    pub tcp: TcpListenerConfig,

    /// UDP listener settings.
    pub udp: UdpListenerConfig,

    /// Origin server endpoints.
    pub origin: OriginConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Periodic stats report settings.
    pub stats: StatsConfig,
}

/// TCP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TcpListenerConfig {
    /// Bind address for client HTTP requests.
    pub bind_address: String,
}

impl Default for TcpListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// UDP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UdpListenerConfig {
    /// Bind address for client QoS datagrams.
    pub bind_address: String,
}

impl Default for UdpListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Origin server endpoints the proxy forwards to.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Origin HTTP endpoint.
    pub tcp_address: String,

    /// Origin UDP echo endpoint.
    pub udp_address: String,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            tcp_address: "127.0.0.1:8000".to_string(),
            udp_address: "127.0.0.1:9000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Socket timeout in seconds, applied to the request receive, the origin
    /// connect/read, and the UDP round trip.
    pub socket_secs: u64,
}

impl TimeoutConfig {
    pub fn socket_timeout(&self) -> Duration {
        Duration::from_secs(self.socket_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { socket_secs: 8 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}

/// Periodic stats report configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Seconds between stats reports.
    pub report_interval_secs: u64,
}

impl StatsConfig {
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: 30,
        }
    }
}
