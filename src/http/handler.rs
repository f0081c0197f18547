//! The single catch-all request handler.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Extension;

use crate::auth::PeerAuthorization;
use crate::config::ResponseConfig;
use crate::http::response::{payload, Reply};
use crate::observability::metrics;

/// Body prefix of every 401; the authorization error code follows it.
pub const UNAUTHORIZED_PREFIX: &str = "Invalid client certificate authentication. ";

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub response: Arc<ResponseConfig>,
}

/// Decide the reply for a request on a connection with the given
/// authorization state. Method and path do not matter.
pub fn respond(config: &ResponseConfig, authorization: &PeerAuthorization) -> Reply {
    match authorization {
        PeerAuthorization::Unauthorized(err) if config.enforce_authorization => Reply::text(
            StatusCode::UNAUTHORIZED,
            format!("{UNAUTHORIZED_PREFIX}{err}"),
        ),
        _ => payload(config),
    }
}

pub async fn responder_handler(
    State(state): State<AppState>,
    Extension(authorization): Extension<PeerAuthorization>,
    method: Method,
    uri: Uri,
) -> Response {
    let start_time = Instant::now();
    let reply = respond(&state.response, &authorization);

    if reply.status == StatusCode::UNAUTHORIZED {
        tracing::info!(
            method = %method,
            path = %uri.path(),
            reason = ?authorization.error(),
            "Rejected request with unauthorized client certificate"
        );
    } else {
        tracing::debug!(method = %method, path = %uri.path(), status = %reply.status, "Request served");
    }

    metrics::record_request(reply.status.as_u16(), start_time);
    reply.into_response()
}
