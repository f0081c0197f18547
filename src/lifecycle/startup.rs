//! Startup orchestration.
//!
//! Order: TLS material → trust store → TLS config → listener → metrics
//! exporter. Any failure is fatal; no port is bound until the certificates
//! have loaded.

use std::net::AddrParseError;
use std::path::Path;
use std::sync::Arc;

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;

use crate::auth::trust::load_trust_store;
use crate::auth::TrustError;
use crate::config::ResponderConfig;
use crate::http::ResponderServer;
use crate::net::{build_tls, Listener, ListenerError, TlsError, TlsMaterial, TlsSetup};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("TLS setup failed: {0}")]
    Tls(#[from] TlsError),

    #[error("trust store setup failed: {0}")]
    Trust(#[from] TrustError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("invalid metrics address: {0}")]
    MetricsAddress(#[from] AddrParseError),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] BuildError),
}

/// Load certificates and build the TLS setup described by `config`.
/// Returns `None` for plain HTTP.
pub fn prepare_tls(config: &ResponderConfig) -> Result<Option<TlsSetup>, StartupError> {
    let tls = &config.tls;
    if !tls.enabled {
        return Ok(None);
    }

    let material = TlsMaterial::from_files(Path::new(&tls.cert_path), Path::new(&tls.key_path))?;
    tracing::info!(
        cert_path = %tls.cert_path,
        key_path = %tls.key_path,
        chain_length = material.cert_chain.len(),
        "Loaded server certificate"
    );

    let roots = load_trust_store(tls)?;
    Ok(Some(build_tls(material, roots, tls)?))
}

/// Prepare the server, bind its listener and start the metrics exporter
/// when one is configured.
pub async fn start(config: ResponderConfig) -> Result<(ResponderServer, Listener), StartupError> {
    let tls = prepare_tls(&config)?;
    let listener = Listener::bind(&config.listener).await?;
    if let Some(address) = &config.observability.metrics_address {
        metrics::init_metrics(address.parse()?)?;
    }
    let server = ResponderServer::new(Arc::new(config), tls);
    Ok((server, listener))
}
