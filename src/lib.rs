//! Dual-protocol caching forward proxy library.

pub mod cache;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod proxy;

pub use cache::HttpCache;
pub use config::ProxyConfig;
pub use lifecycle::Shutdown;
pub use proxy::{ProxyStats, TcpProxy, UdpProxy, UdpStats};
