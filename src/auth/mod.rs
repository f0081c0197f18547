//! Client certificate authentication.
//!
//! # Data Flow
//! ```text
//! tls.ca_path + ca-certificates bindings
//!     → trust.rs (RootCertStore → WebPKI verifier)
//!     → verifier.rs (handshake: reject now, or accept and defer)
//!     → authorization.rs (after handshake: PeerAuthorization per connection)
//!     → request extensions → handler
//! ```

pub mod authorization;
pub mod trust;
pub mod verifier;

pub use authorization::{AuthorizationError, Authorizer, PeerAuthorization};
pub use trust::TrustError;
pub use verifier::DeferredClientVerifier;
