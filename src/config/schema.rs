//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.
//! Every field has a default so an empty file (or no file at all) yields
//! the same setup as the plain `cert.pem`/`key.pem` fixture server.

use serde::{Deserialize, Serialize};

/// Root configuration for the responder.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ResponderConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// TLS and client authentication settings.
    pub tls: TlsConfig,

    /// What gets written back to authorized clients.
    pub response: ResponseConfig,

    /// Shutdown behaviour.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ResponderConfig {
    /// Socket address string the listener binds to.
    pub fn bind_address(&self) -> String {
        self.listener.bind_address()
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host or IP to bind (e.g., "0.0.0.0").
    pub bind_host: String,

    /// TCP port. Overridden by the `PORT` environment variable.
    pub port: u16,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl ListenerConfig {
    /// `host:port`, bracketing IPv6 hosts.
    pub fn bind_address(&self) -> String {
        if self.bind_host.contains(':') {
            format!("[{}]:{}", self.bind_host, self.port)
        } else {
            format!("{}:{}", self.bind_host, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 8080,
            max_connections: 1024,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Serve HTTPS. When false the listener speaks plain HTTP.
    pub enabled: bool,

    /// Path to certificate chain file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,

    /// Ask connecting clients for a certificate.
    pub request_client_cert: bool,

    /// Abort the handshake when the client certificate is missing or
    /// untrusted instead of deferring the decision to the handler.
    pub reject_unauthorized: bool,

    /// Optional PEM bundle of CAs trusted to sign client certificates.
    pub ca_path: Option<String>,

    /// Root directory of service bindings. Falls back to the
    /// `SERVICE_BINDING_ROOT` environment variable.
    pub service_binding_root: Option<String>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cert_path: "cert.pem".to_string(),
            key_path: "key.pem".to_string(),
            request_client_cert: true,
            reject_unauthorized: false,
            ca_path: None,
            service_binding_root: None,
        }
    }
}

/// Body served to authorized clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    /// The fixed greeting string.
    #[default]
    Greeting,
    /// JSON object of the process environment.
    Environment,
}

/// Response configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseConfig {
    pub payload: PayloadKind,

    /// Body for the `greeting` payload.
    pub greeting: String,

    /// Answer 401 when the peer certificate was not authorized.
    pub enforce_authorization: bool,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            payload: PayloadKind::Greeting,
            greeting: "Hello, world!".to_string(),
            enforce_authorization: true,
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Upper bound on waiting for in-flight connections, in seconds.
    /// Zero waits indefinitely.
    pub drain_timeout_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Prometheus endpoint bind address. Disabled when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_address: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_address_brackets_ipv6() {
        let mut listener = ListenerConfig::default();
        assert_eq!(listener.bind_address(), "0.0.0.0:8080");

        listener.bind_host = "::".into();
        assert_eq!(listener.bind_address(), "[::]:8080");
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config: ResponderConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.response.payload, PayloadKind::Greeting);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn enums_use_snake_case() {
        let config: ResponderConfig = toml::from_str(
            "[response]\npayload = \"environment\"\n[observability]\nlog_format = \"json\"",
        )
        .unwrap();
        assert_eq!(config.response.payload, PayloadKind::Environment);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
