//! Forwarding proxy subsystem.
//!
//! # Data Flow
//! ```text
//! TCP:
//!     client connection
//!         → tcp.rs (accept, one 4096-byte read, request-line parse)
//!         → cache lookup
//!             HIT  → serve cached bytes
//!             MISS → origin.rs (fresh connection, bounded round trip)
//!                  → cache admission (200-prefix filter)
//!                  → serve
//!         → transaction event + stats.rs counters
//!
//! UDP:
//!     client datagram
//!         → udp.rs (receive, spawn per-datagram task)
//!         → fresh ephemeral socket round trip to origin
//!             reply   → relay verbatim to source address
//!             failure → silence (client observes loss)
//!         → stats.rs counters
//! ```
//!
//! # Design Decisions
//! - Task per connection/datagram, unbounded: load is bounded only by OS
//!   resources, matching the traffic this proxy is built for
//! - Cache and counters are the only shared state, injected at construction
//! - Origin failures map deterministically to synthetic 502/504 responses

pub mod origin;
pub mod stats;
pub mod tcp;
pub mod udp;

pub use origin::{ForwardError, OriginClient};
pub use stats::{ProxyStats, UdpStats};
pub use tcp::TcpProxy;
pub use udp::UdpProxy;
