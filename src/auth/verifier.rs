//! Handshake-time client certificate verifier.
//!
//! Always asks for a client certificate. With `reject_unauthorized` the
//! chain is checked during the handshake and a missing or untrusted
//! certificate aborts it. Without it, any chain is accepted so the
//! connection can be established and answered with a 401; the actual
//! verdict comes from [`Authorizer`](super::Authorizer) after the
//! handshake. Handshake signatures are always checked: a peer must prove
//! possession of the key for whatever certificate it sends.

use std::sync::Arc;

use rustls::client::danger::HandshakeSignatureValid;
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, WebPkiSupportedAlgorithms};
use rustls::pki_types::{CertificateDer, UnixTime};
use rustls::server::danger::{ClientCertVerified, ClientCertVerifier};
use rustls::{CertificateError, DigitallySignedStruct, DistinguishedName, SignatureScheme};

#[derive(Debug)]
pub struct DeferredClientVerifier {
    trust: Option<Arc<dyn ClientCertVerifier>>,
    reject_unauthorized: bool,
    algorithms: WebPkiSupportedAlgorithms,
}

impl DeferredClientVerifier {
    pub fn new(
        trust: Option<Arc<dyn ClientCertVerifier>>,
        reject_unauthorized: bool,
        algorithms: WebPkiSupportedAlgorithms,
    ) -> Self {
        Self {
            trust,
            reject_unauthorized,
            algorithms,
        }
    }
}

impl ClientCertVerifier for DeferredClientVerifier {
    fn offer_client_auth(&self) -> bool {
        true
    }

    fn client_auth_mandatory(&self) -> bool {
        self.reject_unauthorized
    }

    fn root_hint_subjects(&self) -> &[DistinguishedName] {
        match &self.trust {
            Some(trust) => trust.root_hint_subjects(),
            None => &[],
        }
    }

    fn verify_client_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        now: UnixTime,
    ) -> Result<ClientCertVerified, rustls::Error> {
        if !self.reject_unauthorized {
            return Ok(ClientCertVerified::assertion());
        }
        match &self.trust {
            Some(trust) => trust.verify_client_cert(end_entity, intermediates, now),
            None => Err(rustls::Error::InvalidCertificate(
                CertificateError::UnknownIssuer,
            )),
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}
