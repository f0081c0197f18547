//! TLS mutual-authentication HTTP responder.
//!
//! Terminates TLS with a fixed certificate/key pair, optionally requests a
//! client certificate, and answers every request with a fixed payload or a
//! 401 explaining why the client certificate was not authorized.

pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ResponderConfig;
pub use http::ResponderServer;
pub use lifecycle::Shutdown;
