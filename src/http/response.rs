//! Response bodies and their conversion into HTTP responses.

use std::collections::BTreeMap;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::config::{PayloadKind, ResponseConfig};

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const APPLICATION_JSON: &str = "application/json";

/// Status and body for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: TEXT_PLAIN,
            body: body.into(),
        }
    }

    pub fn json(status: StatusCode, body: String) -> Self {
        Self {
            status,
            content_type: APPLICATION_JSON,
            body,
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, HeaderValue::from_static(self.content_type))],
            self.body,
        )
            .into_response()
    }
}

/// The body served to authorized clients.
pub fn payload(config: &ResponseConfig) -> Reply {
    match config.payload {
        PayloadKind::Greeting => Reply::text(StatusCode::OK, config.greeting.clone()),
        PayloadKind::Environment => {
            let vars = std::env::vars_os().map(|(key, value)| {
                (
                    key.to_string_lossy().into_owned(),
                    value.to_string_lossy().into_owned(),
                )
            });
            Reply::json(StatusCode::OK, environment_json(vars))
        }
    }
}

/// Serialize environment variables as a JSON object with sorted keys.
pub fn environment_json<I>(vars: I) -> String
where
    I: IntoIterator<Item = (String, String)>,
{
    let object: serde_json::Map<String, serde_json::Value> = vars
        .into_iter()
        .collect::<BTreeMap<_, _>>()
        .into_iter()
        .map(|(key, value)| (key, serde_json::Value::String(value)))
        .collect();
    serde_json::Value::Object(object).to_string()
}
