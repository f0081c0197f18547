//! Per-connection client certificate authorization.
//!
//! The handshake only records which certificates the peer presented. The
//! verdict is computed once per connection, right after the handshake, and
//! attached to every request served on that connection.

use std::fmt;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, UnixTime};
use rustls::server::danger::ClientCertVerifier;
use rustls::{CertificateError, Error as RustlsError};

/// Why a peer certificate was not authorized.
///
/// Rendered as the OpenSSL verification code clients of the fixture
/// servers expect in the 401 body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationError {
    /// The peer sent no certificate, or none was requested.
    NoPeerCertificate,
    /// The chain does not lead to a trusted CA.
    UnknownIssuer,
    Expired,
    NotYetValid,
    Revoked,
    BadSignature,
    /// The certificate is not valid for client authentication.
    InvalidPurpose,
    /// Any other rejection, including undecodable certificates.
    Rejected,
}

impl AuthorizationError {
    /// The OpenSSL-style verification code.
    pub fn code(&self) -> &'static str {
        match self {
            // OpenSSL reports this when no peer certificate exists at all.
            AuthorizationError::NoPeerCertificate => "UNABLE_TO_GET_ISSUER_CERT",
            AuthorizationError::UnknownIssuer => "UNABLE_TO_GET_ISSUER_CERT_LOCALLY",
            AuthorizationError::Expired => "CERT_HAS_EXPIRED",
            AuthorizationError::NotYetValid => "CERT_NOT_YET_VALID",
            AuthorizationError::Revoked => "CERT_REVOKED",
            AuthorizationError::BadSignature => "CERT_SIGNATURE_FAILURE",
            AuthorizationError::InvalidPurpose => "INVALID_PURPOSE",
            AuthorizationError::Rejected => "CERT_REJECTED",
        }
    }

    fn from_rustls(err: &RustlsError) -> Self {
        match err {
            RustlsError::InvalidCertificate(cert_err) => match cert_err {
                CertificateError::UnknownIssuer => AuthorizationError::UnknownIssuer,
                CertificateError::Expired | CertificateError::ExpiredContext { .. } => {
                    AuthorizationError::Expired
                }
                CertificateError::NotValidYet | CertificateError::NotValidYetContext { .. } => {
                    AuthorizationError::NotYetValid
                }
                CertificateError::Revoked => AuthorizationError::Revoked,
                CertificateError::BadSignature => AuthorizationError::BadSignature,
                CertificateError::InvalidPurpose => AuthorizationError::InvalidPurpose,
                _ => AuthorizationError::Rejected,
            },
            _ => AuthorizationError::Rejected,
        }
    }
}

impl fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::error::Error for AuthorizationError {}

/// Authorization state of one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerAuthorization {
    Authorized,
    Unauthorized(AuthorizationError),
}

impl PeerAuthorization {
    pub fn is_authorized(&self) -> bool {
        matches!(self, PeerAuthorization::Authorized)
    }

    /// The failure reason, if any.
    pub fn error(&self) -> Option<AuthorizationError> {
        match self {
            PeerAuthorization::Authorized => None,
            PeerAuthorization::Unauthorized(err) => Some(*err),
        }
    }
}

/// Evaluates presented certificate chains against the trust store.
#[derive(Debug, Clone)]
pub struct Authorizer {
    /// `None` when no CA is trusted; nothing can be authorized then.
    trust: Option<Arc<dyn ClientCertVerifier>>,
}

impl Authorizer {
    pub fn new(trust: Option<Arc<dyn ClientCertVerifier>>) -> Self {
        Self { trust }
    }

    /// Decide on the chain a peer presented during the handshake.
    pub fn authorize(&self, peer_certs: Option<&[CertificateDer<'_>]>) -> PeerAuthorization {
        self.authorize_at(peer_certs, UnixTime::now())
    }

    /// Same as [`Authorizer::authorize`] with an explicit verification time.
    pub fn authorize_at(
        &self,
        peer_certs: Option<&[CertificateDer<'_>]>,
        now: UnixTime,
    ) -> PeerAuthorization {
        let Some((end_entity, intermediates)) = peer_certs.and_then(|certs| certs.split_first())
        else {
            return PeerAuthorization::Unauthorized(AuthorizationError::NoPeerCertificate);
        };

        let Some(trust) = &self.trust else {
            return PeerAuthorization::Unauthorized(AuthorizationError::UnknownIssuer);
        };

        match trust.verify_client_cert(end_entity, intermediates, now) {
            Ok(_) => PeerAuthorization::Authorized,
            Err(err) => {
                tracing::debug!(error = %err, "Client certificate not authorized");
                PeerAuthorization::Unauthorized(AuthorizationError::from_rustls(&err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_openssl_names() {
        assert_eq!(
            AuthorizationError::NoPeerCertificate.to_string(),
            "UNABLE_TO_GET_ISSUER_CERT"
        );
        assert_eq!(
            AuthorizationError::UnknownIssuer.to_string(),
            "UNABLE_TO_GET_ISSUER_CERT_LOCALLY"
        );
        assert_eq!(AuthorizationError::Expired.code(), "CERT_HAS_EXPIRED");
    }

    #[test]
    fn rustls_errors_are_mapped() {
        let cases = [
            (CertificateError::UnknownIssuer, AuthorizationError::UnknownIssuer),
            (CertificateError::Expired, AuthorizationError::Expired),
            (CertificateError::NotValidYet, AuthorizationError::NotYetValid),
            (CertificateError::Revoked, AuthorizationError::Revoked),
            (CertificateError::BadSignature, AuthorizationError::BadSignature),
            (CertificateError::InvalidPurpose, AuthorizationError::InvalidPurpose),
            (CertificateError::BadEncoding, AuthorizationError::Rejected),
        ];
        for (cert_err, expected) in cases {
            let err = RustlsError::InvalidCertificate(cert_err);
            assert_eq!(AuthorizationError::from_rustls(&err), expected);
        }
        assert_eq!(
            AuthorizationError::from_rustls(&RustlsError::DecryptError),
            AuthorizationError::Rejected
        );
    }

    #[test]
    fn missing_certificate_is_unauthorized() {
        let authorizer = Authorizer::new(None);
        assert_eq!(
            authorizer.authorize(None),
            PeerAuthorization::Unauthorized(AuthorizationError::NoPeerCertificate)
        );
        assert_eq!(
            authorizer.authorize(Some(&[])),
            PeerAuthorization::Unauthorized(AuthorizationError::NoPeerCertificate)
        );
    }

    #[test]
    fn empty_trust_store_cannot_authorize() {
        let authorizer = Authorizer::new(None);
        let cert = CertificateDer::from(vec![0x30, 0x00]);
        let verdict = authorizer.authorize(Some(&[cert]));
        assert!(!verdict.is_authorized());
        assert_eq!(verdict.error(), Some(AuthorizationError::UnknownIssuer));
    }
}
