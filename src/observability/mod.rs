//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Listeners produce:
//!     → logging.rs (structured transaction events)
//!     → metrics.rs (counters, histogram, gauge)
//!
//! reporter.rs consumes:
//!     ProxyStats + UdpStats + cache snapshot → periodic report event
//!
//! Consumers:
//!     → stdout log stream
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - One transaction event per request/packet; the record itself is never
//!   stored, only emitted
//! - Metrics are cheap atomic updates and safe to call with no exporter

pub mod logging;
pub mod metrics;
pub mod reporter;

pub use reporter::StatsReporter;
