//! HTTP layer.
//!
//! # Data Flow
//! ```text
//! Connection (TLS or plain) + PeerAuthorization
//!     → server.rs (hyper connection, request extensions)
//!     → request.rs (x-request-id)
//!     → handler.rs (respond: payload or 401)
//!     → response.rs (body rendering)
//! ```

pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use handler::{respond, AppState, UNAUTHORIZED_PREFIX};
pub use request::X_REQUEST_ID;
pub use response::Reply;
pub use server::ResponderServer;
