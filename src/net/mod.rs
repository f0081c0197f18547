//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → tls.rs (TLS handshake, client certificate request)
//!     → connection.rs (id, drain tracking)
//!     → Hand off to HTTP layer
//! ```
//!
//! TLS is optional; with `tls.enabled = false` connections go straight to
//! the HTTP layer.

pub mod connection;
pub mod listener;
pub mod tls;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{ConnectionPermit, Listener, ListenerError};
pub use tls::{build_tls, TlsError, TlsMaterial, TlsSetup};
