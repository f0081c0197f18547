//! TLS configuration and certificate loading.

use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{RootCertStore, ServerConfig};
use thiserror::Error;
use tokio_rustls::TlsAcceptor;

use crate::auth::trust::build_trust_verifier;
use crate::auth::{Authorizer, DeferredClientVerifier, TrustError};
use crate::config::TlsConfig;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed PEM data: {0}")]
    Pem(std::io::Error),

    #[error("no certificate found in PEM data")]
    NoCertificates,

    #[error("no private key found in PEM data")]
    NoPrivateKey,

    #[error("invalid certificate/key pair: {0}")]
    Rustls(#[from] rustls::Error),

    #[error(transparent)]
    Trust(#[from] TrustError),
}

/// Server certificate chain and private key.
#[derive(Debug)]
pub struct TlsMaterial {
    pub cert_chain: Vec<CertificateDer<'static>>,
    pub key: PrivateKeyDer<'static>,
}

impl TlsMaterial {
    /// Parse a PEM certificate chain and a PEM private key.
    pub fn from_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<Self, TlsError> {
        let cert_chain = rustls_pemfile::certs(&mut BufReader::new(cert_pem))
            .collect::<Result<Vec<_>, _>>()
            .map_err(TlsError::Pem)?;
        if cert_chain.is_empty() {
            return Err(TlsError::NoCertificates);
        }

        let key = rustls_pemfile::private_key(&mut BufReader::new(key_pem))
            .map_err(TlsError::Pem)?
            .ok_or(TlsError::NoPrivateKey)?;

        Ok(Self { cert_chain, key })
    }

    /// Read and parse the certificate and key files.
    pub fn from_files(cert_path: &Path, key_path: &Path) -> Result<Self, TlsError> {
        let read = |path: &Path| {
            fs::read(path).map_err(|source| TlsError::Io {
                path: path.to_path_buf(),
                source,
            })
        };
        let cert_pem = read(cert_path)?;
        let key_pem = read(key_path)?;
        Self::from_pem(&cert_pem, &key_pem)
    }
}

/// Everything a connection needs to terminate TLS and authorize its peer.
#[derive(Clone)]
pub struct TlsSetup {
    pub acceptor: TlsAcceptor,
    pub authorizer: Authorizer,
}

/// The crypto provider used for both the handshake and chain verification.
pub fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Build the server-side TLS configuration.
///
/// When `request_client_cert` is off no certificate is requested and every
/// peer ends up unauthorized.
pub fn build_tls(
    material: TlsMaterial,
    roots: RootCertStore,
    config: &TlsConfig,
) -> Result<TlsSetup, TlsError> {
    let provider = crypto_provider();
    let trust = build_trust_verifier(roots, provider.clone())?;
    if config.request_client_cert && config.reject_unauthorized && trust.is_none() {
        return Err(TrustError::NoTrustAnchors.into());
    }

    let builder = ServerConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()?;

    let builder = if config.request_client_cert {
        let verifier = DeferredClientVerifier::new(
            trust.clone(),
            config.reject_unauthorized,
            provider.signature_verification_algorithms,
        );
        builder.with_client_cert_verifier(Arc::new(verifier))
    } else {
        builder.with_no_client_auth()
    };

    let mut server_config = builder.with_single_cert(material.cert_chain, material.key)?;
    server_config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    tracing::debug!(
        request_client_cert = config.request_client_cert,
        reject_unauthorized = config.reject_unauthorized,
        trusted_roots = trust.is_some(),
        "TLS configuration built"
    );

    Ok(TlsSetup {
        acceptor: TlsAcceptor::from(Arc::new(server_config)),
        authorizer: Authorizer::new(trust),
    })
}
