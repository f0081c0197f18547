//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load certificates → Build trust store → Build TLS config → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → Trigger graceful shutdown
//! ```
//!
//! Any startup error is fatal. Draining is bounded by
//! `shutdown.drain_timeout_secs`.

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{start, StartupError};
