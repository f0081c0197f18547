//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → config file (TOML, optional)
//!     → environment (PORT, SERVICE_BINDING_ROOT)
//!     → command-line overrides
//!     → validation.rs (semantic checks)
//!     → ResponderConfig (validated, immutable)
//!     → shared via Arc with every connection task
//! ```
//!
//! Config is immutable once loaded; there is no reload path.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, Overrides};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, PayloadKind, ResponderConfig, ResponseConfig,
    ShutdownConfig, TlsConfig,
};
