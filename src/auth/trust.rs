//! Trust store for client certificates.
//!
//! Sources:
//! - `tls.ca_path`: a PEM bundle of CA certificates.
//! - Service bindings of type `ca-certificates` under the binding root.
//!   A binding is a directory holding a `type` file; every other regular
//!   file in a `ca-certificates` binding is read as a PEM bundle.

use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::crypto::CryptoProvider;
use rustls::pki_types::CertificateDer;
use rustls::server::danger::ClientCertVerifier;
use rustls::server::WebPkiClientVerifier;
use rustls::RootCertStore;
use thiserror::Error;

use crate::config::TlsConfig;

/// Binding type that contributes CA certificates.
pub const CA_CERTIFICATES_BINDING: &str = "ca-certificates";

#[derive(Debug, Error)]
pub enum TrustError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificates found in {0:?}")]
    Empty(PathBuf),

    #[error("reject_unauthorized is set but the trust store is empty")]
    NoTrustAnchors,

    #[error("failed to build client verifier: {0}")]
    Verifier(#[from] rustls::server::VerifierBuilderError),
}

/// Read every certificate in a PEM file.
pub fn read_pem_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TrustError> {
    let io_err = |source| TrustError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = fs::File::open(path).map_err(io_err)?;
    rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)
}

/// Collect CA certificates from the `ca-certificates` bindings below `root`.
///
/// A missing root means no bindings.
pub fn binding_certs(root: &Path) -> Result<Vec<CertificateDer<'static>>, TrustError> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(root = ?root, "Service binding root does not exist");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(TrustError::Io {
                path: root.to_path_buf(),
                source,
            })
        }
    };

    let mut certs = Vec::new();
    let mut bindings: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    bindings.sort();

    for binding in bindings {
        let kind = match fs::read_to_string(binding.join("type")) {
            Ok(kind) => kind,
            Err(_) => continue,
        };
        if kind.trim() != CA_CERTIFICATES_BINDING {
            continue;
        }

        let mut files: Vec<PathBuf> = fs::read_dir(&binding)
            .map_err(|source| TrustError::Io {
                path: binding.clone(),
                source,
            })?
            .filter_map(Result::ok)
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                !name.starts_with('.') && name != "type" && name != "provider"
            })
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        for file in files {
            let found = read_pem_certs(&file)?;
            tracing::debug!(binding = ?binding, file = ?file, count = found.len(), "Read binding certificates");
            certs.extend(found);
        }
    }

    Ok(certs)
}

/// Log line announcing CA certificates taken from service bindings.
pub fn added_certificates_message(count: usize) -> String {
    format!("Added {count} additional CA certificate(s) to system truststore")
}

/// Build the root store from the configured sources.
pub fn load_trust_store(config: &TlsConfig) -> Result<RootCertStore, TrustError> {
    let mut roots = RootCertStore::empty();

    if let Some(ca_path) = &config.ca_path {
        let path = Path::new(ca_path);
        let certs = read_pem_certs(path)?;
        if certs.is_empty() {
            return Err(TrustError::Empty(path.to_path_buf()));
        }
        let (added, ignored) = roots.add_parsable_certificates(certs);
        tracing::info!(path = %ca_path, added, ignored, "Loaded CA bundle");
    }

    if let Some(root) = &config.service_binding_root {
        let certs = binding_certs(Path::new(root))?;
        if !certs.is_empty() {
            let (added, ignored) = roots.add_parsable_certificates(certs);
            tracing::info!(root = %root, ignored, "{}", added_certificates_message(added));
        }
    }

    Ok(roots)
}

/// WebPKI verifier over `roots`, or `None` when nothing is trusted.
///
/// Unauthenticated clients are allowed here; whether a missing certificate
/// fails the handshake is decided by the handshake verifier.
pub fn build_trust_verifier(
    roots: RootCertStore,
    provider: Arc<CryptoProvider>,
) -> Result<Option<Arc<dyn ClientCertVerifier>>, TrustError> {
    if roots.is_empty() {
        return Ok(None);
    }
    let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider)
        .allow_unauthenticated()
        .build()?;
    Ok(Some(verifier))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ca_pem(name: &str) -> String {
        let key = rcgen::KeyPair::generate().unwrap();
        let mut params = rcgen::CertificateParams::new(Vec::<String>::new()).unwrap();
        params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
        params
            .distinguished_name
            .push(rcgen::DnType::CommonName, name);
        params.self_signed(&key).unwrap().pem()
    }

    fn write_binding(root: &Path, name: &str, kind: &str, files: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("type"), kind).unwrap();
        for (file, content) in files {
            fs::write(dir.join(file), content).unwrap();
        }
    }

    #[test]
    fn missing_binding_root_is_empty() {
        let certs = binding_certs(Path::new("/nonexistent/bindings")).unwrap();
        assert!(certs.is_empty());
    }

    #[test]
    fn only_ca_certificate_bindings_contribute() {
        let root = tempfile::tempdir().unwrap();
        let bundle = format!("{}{}", ca_pem("first"), ca_pem("second"));
        write_binding(root.path(), "ca-certificates", "ca-certificates\n", &[("bundle.pem", bundle.as_str())]);
        write_binding(root.path(), "other", "mysql", &[("ca.pem", ca_pem("ignored").as_str())]);
        fs::write(root.path().join("ca-certificates").join("provider"), "paketo").unwrap();

        let certs = binding_certs(root.path()).unwrap();
        assert_eq!(certs.len(), 2);
    }

    #[test]
    fn trust_store_combines_sources() {
        let root = tempfile::tempdir().unwrap();
        write_binding(root.path(), "certs", "ca-certificates", &[("ca.pem", ca_pem("binding").as_str())]);

        let ca_file = root.path().join("bundle.pem");
        fs::write(&ca_file, ca_pem("bundle")).unwrap();

        let config = TlsConfig {
            ca_path: Some(ca_file.to_string_lossy().into_owned()),
            service_binding_root: Some(root.path().to_string_lossy().into_owned()),
            ..TlsConfig::default()
        };
        let roots = load_trust_store(&config).unwrap();
        assert_eq!(roots.len(), 2);
    }

    #[test]
    fn empty_ca_bundle_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ca_file = dir.path().join("empty.pem");
        fs::write(&ca_file, "").unwrap();

        let config = TlsConfig {
            ca_path: Some(ca_file.to_string_lossy().into_owned()),
            ..TlsConfig::default()
        };
        assert!(matches!(load_trust_store(&config), Err(TrustError::Empty(_))));
    }

    #[test]
    fn no_roots_means_no_verifier() {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let verifier = build_trust_verifier(RootCertStore::empty(), provider).unwrap();
        assert!(verifier.is_none());
    }

    #[test]
    fn binding_log_line_names_the_system_truststore() {
        assert_eq!(
            added_certificates_message(1),
            "Added 1 additional CA certificate(s) to system truststore"
        );
    }
}
