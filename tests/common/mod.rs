//! Shared utilities for integration tests: a throwaway PKI, a server
//! harness and mTLS clients.

#![allow(dead_code)]

use std::io::BufReader;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mtls_responder::config::ResponderConfig;
use mtls_responder::lifecycle::Shutdown;
use mtls_responder::net::{build_tls, Listener, ListenerError, TlsMaterial};
use mtls_responder::ResponderServer;
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, KeyUsagePurpose,
};
use rustls::RootCertStore;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A certificate with its key, both PEM encoded.
#[derive(Clone)]
pub struct Issued {
    pub cert_pem: String,
    pub key_pem: String,
}

impl Issued {
    /// Certificate followed by key, the format `reqwest::Identity` expects.
    pub fn identity_pem(&self) -> Vec<u8> {
        format!("{}\n{}", self.cert_pem, self.key_pem).into_bytes()
    }
}

/// Test PKI: one CA signing the server and the trusted client, plus an
/// unrelated self-signed client and an expired client.
pub struct Pki {
    pub ca_pem: String,
    pub server: Issued,
    pub client: Issued,
    pub expired_client: Issued,
    pub untrusted_client: Issued,
}

struct Authority {
    cert: Certificate,
    key: KeyPair,
}

fn authority(name: &str) -> Authority {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.distinguished_name.push(DnType::CommonName, name);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];
    let cert = params.self_signed(&key).unwrap();
    Authority { cert, key }
}

fn issue(
    ca: &Authority,
    name: &str,
    purpose: ExtendedKeyUsagePurpose,
    expired: bool,
) -> Issued {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(vec![name.to_string()]).unwrap();
    params.distinguished_name.push(DnType::CommonName, name);
    params.extended_key_usages = vec![purpose];
    if expired {
        params.not_before = rcgen::date_time_ymd(2000, 1, 1);
        params.not_after = rcgen::date_time_ymd(2001, 1, 1);
    }
    let cert = params.signed_by(&key, &ca.cert, &ca.key).unwrap();
    Issued {
        cert_pem: cert.pem(),
        key_pem: key.serialize_pem(),
    }
}

impl Pki {
    pub fn generate() -> Self {
        let ca = authority("Test Root CA");
        let rogue = authority("Rogue CA");

        Self {
            ca_pem: ca.cert.pem(),
            server: issue(&ca, "localhost", ExtendedKeyUsagePurpose::ServerAuth, false),
            client: issue(&ca, "client", ExtendedKeyUsagePurpose::ClientAuth, false),
            expired_client: issue(&ca, "expired", ExtendedKeyUsagePurpose::ClientAuth, true),
            untrusted_client: issue(&rogue, "intruder", ExtendedKeyUsagePurpose::ClientAuth, false),
        }
    }

    pub fn roots(&self) -> RootCertStore {
        let mut roots = RootCertStore::empty();
        for cert in rustls_pemfile::certs(&mut BufReader::new(self.ca_pem.as_bytes())) {
            roots.add(cert.unwrap()).unwrap();
        }
        roots
    }
}

/// A server running in the background.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), ListenerError>>,
}

impl TestServer {
    /// Trigger shutdown and wait for `run` to return.
    pub async fn stop(self) -> Result<(), ListenerError> {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
    }
}

/// Base config for tests: loopback, ephemeral port, short drain.
pub fn test_config() -> ResponderConfig {
    let mut config = ResponderConfig::default();
    config.listener.bind_host = "127.0.0.1".into();
    config.listener.port = 0;
    config.shutdown.drain_timeout_secs = 5;
    config
}

/// Start a server with `config`, trusting `pki`'s CA when `trust_ca` is set.
pub async fn start_server(config: ResponderConfig, pki: &Pki, trust_ca: bool) -> TestServer {
    let tls = if config.tls.enabled {
        let material =
            TlsMaterial::from_pem(pki.server.cert_pem.as_bytes(), pki.server.key_pem.as_bytes())
                .unwrap();
        let roots = if trust_ca { pki.roots() } else { RootCertStore::empty() };
        Some(build_tls(material, roots, &config.tls).unwrap())
    } else {
        None
    };

    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = tcp.local_addr().unwrap();
    let listener = Listener::from_tcp(tcp, config.listener.max_connections);

    let server = ResponderServer::new(Arc::new(config), tls);
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.clone()));

    TestServer {
        addr,
        shutdown,
        handle,
    }
}

/// HTTPS client trusting the test CA, presenting `identity` if given.
pub fn client(pki: &Pki, addr: SocketAddr, identity: Option<&Issued>) -> reqwest::Client {
    let ca = reqwest::Certificate::from_pem(pki.ca_pem.as_bytes()).unwrap();
    let mut builder = reqwest::Client::builder()
        .use_rustls_tls()
        .tls_built_in_root_certs(false)
        .add_root_certificate(ca)
        .resolve("localhost", addr)
        .no_proxy()
        .timeout(Duration::from_secs(10));
    if let Some(identity) = identity {
        builder = builder.identity(reqwest::Identity::from_pem(&identity.identity_pem()).unwrap());
    }
    builder.build().unwrap()
}

pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("https://localhost:{}{}", addr.port(), path)
}
