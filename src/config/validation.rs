//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and flag
//! combinations. All problems are reported at once, not just the first.

use std::net::IpAddr;

use thiserror::Error;

use crate::config::schema::ResponderConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_host {0:?} is not an IP address")]
    InvalidBindHost(String),

    #[error("listener.max_connections must be greater than zero")]
    ZeroMaxConnections,

    #[error("tls.{field} must not be empty")]
    EmptyPath { field: &'static str },

    #[error("tls.reject_unauthorized requires tls.request_client_cert")]
    RejectWithoutRequest,

    #[error("tls.reject_unauthorized requires a trusted CA (tls.ca_path or a ca-certificates binding)")]
    RejectWithoutTrust,

    #[error("response.enforce_authorization requires tls.enabled")]
    EnforceWithoutTls,

    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration.
///
/// A service binding root counts as a trust source even though it may turn
/// out to hold no `ca-certificates` binding; that is caught when the trust
/// store is built.
pub fn validate_config(config: &ResponderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_host.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidBindHost(
            config.listener.bind_host.clone(),
        ));
    }

    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }

    let tls = &config.tls;
    if tls.enabled {
        if tls.cert_path.trim().is_empty() {
            errors.push(ValidationError::EmptyPath { field: "cert_path" });
        }
        if tls.key_path.trim().is_empty() {
            errors.push(ValidationError::EmptyPath { field: "key_path" });
        }
        if tls.reject_unauthorized && !tls.request_client_cert {
            errors.push(ValidationError::RejectWithoutRequest);
        }
        let has_trust = tls.ca_path.is_some() || tls.service_binding_root.is_some();
        if tls.reject_unauthorized && !has_trust {
            errors.push(ValidationError::RejectWithoutTrust);
        }
    } else if config.response.enforce_authorization {
        errors.push(ValidationError::EnforceWithoutTls);
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidMetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&ResponderConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let mut config = ResponderConfig::default();
        config.listener.bind_host = "localhost".into();
        config.listener.max_connections = 0;
        config.tls.key_path = " ".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidBindHost("localhost".into()),
                ValidationError::ZeroMaxConnections,
                ValidationError::EmptyPath { field: "key_path" },
            ]
        );
    }

    #[test]
    fn rejecting_needs_trust_anchors() {
        let mut config = ResponderConfig::default();
        config.tls.reject_unauthorized = true;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::RejectWithoutTrust])
        );

        config.tls.service_binding_root = Some("/bindings".into());
        assert_eq!(validate_config(&config), Ok(()));

        config.tls.service_binding_root = None;
        config.tls.ca_path = Some("ca.pem".into());
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn rejecting_needs_a_requested_cert() {
        let mut config = ResponderConfig::default();
        config.tls.reject_unauthorized = true;
        config.tls.request_client_cert = false;
        config.tls.ca_path = Some("ca.pem".into());
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::RejectWithoutRequest])
        );
    }

    #[test]
    fn plain_http_cannot_enforce_authorization() {
        let mut config = ResponderConfig::default();
        config.tls.enabled = false;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::EnforceWithoutTls])
        );

        config.response.enforce_authorization = false;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn metrics_address_must_parse() {
        let mut config = ResponderConfig::default();
        config.observability.metrics_address = Some("nowhere".into());
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::InvalidMetricsAddress("nowhere".into())])
        );
    }
}
