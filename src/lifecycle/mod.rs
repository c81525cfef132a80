//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init logging/metrics → Bind → Spawn listeners
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C → broadcast signal → accept loops exit →
//!     bounded join of the TCP listener task → exit
//! ```
//!
//! In-flight handlers are never forcibly cancelled; they drain naturally.

pub mod shutdown;

pub use shutdown::Shutdown;
