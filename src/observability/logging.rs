//! Structured logging initialization.
//!
//! # Responsibilities
//! - Install the global tracing subscriber
//! - Default the filter from config, overridable via `RUST_LOG`
//!
//! # Design Decisions
//! - Uses the tracing crate for structured events; every transaction log
//!   carries client, destination, sizes, and latency as fields

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global subscriber. `level` is used when `RUST_LOG` is not
/// set in the environment.
pub fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("forward_proxy={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
