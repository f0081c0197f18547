//! Configuration loading from disk and the process environment.
//!
//! Layers, lowest priority first: built-in defaults, the optional TOML file,
//! environment variables (`PORT`, `SERVICE_BINDING_ROOT`), then explicit
//! command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ResponderConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the listening port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable holding the service binding root.
pub const SERVICE_BINDING_ROOT_ENV: &str = "SERVICE_BINDING_ROOT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("environment variable {name}={value:?} is invalid")]
    InvalidEnv { name: &'static str, value: String },

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
    pub ca_path: Option<String>,
}

/// Load and validate configuration using the process environment.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<ResponderConfig, ConfigError> {
    load_config_with_env(path, overrides, |name| std::env::var(name).ok())
}

/// Load and validate configuration, resolving environment variables through
/// `lookup`.
pub fn load_config_with_env<F>(
    path: Option<&Path>,
    overrides: &Overrides,
    lookup: F,
) -> Result<ResponderConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&content)?
        }
        None => ResponderConfig::default(),
    };

    apply_env(&mut config, &lookup)?;
    apply_overrides(&mut config, overrides);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn apply_env<F>(config: &mut ResponderConfig, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(PORT_ENV).filter(|v| !v.is_empty()) {
        config.listener.port = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            name: PORT_ENV,
            value: value.clone(),
        })?;
    }

    if config.tls.service_binding_root.is_none() {
        config.tls.service_binding_root =
            lookup(SERVICE_BINDING_ROOT_ENV).filter(|v| !v.is_empty());
    }

    Ok(())
}

fn apply_overrides(config: &mut ResponderConfig, overrides: &Overrides) {
    if let Some(port) = overrides.port {
        config.listener.port = port;
    }
    if let Some(cert_path) = &overrides.cert_path {
        config.tls.cert_path = cert_path.clone();
    }
    if let Some(key_path) = &overrides.key_path {
        config.tls.key_path = key_path.clone();
    }
    if let Some(ca_path) = &overrides.ca_path {
        config.tls.ca_path = Some(ca_path.clone());
    }
}
