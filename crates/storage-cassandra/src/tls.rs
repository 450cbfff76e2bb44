// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::{fs::File, io::BufReader, sync::Arc};

use camino::Utf8Path;
use rustls::{
    CertificateError, ClientConfig, DigitallySignedStruct, Error as RustlsError, RootCertStore,
    SignatureScheme,
    client::{
        VerifierBuilderError, WebPkiServerVerifier,
        danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
    },
    crypto::CryptoProvider,
    pki_types::{CertificateDer, ServerName, UnixTime},
};
use thiserror::Error;

/// Errors which can happen while loading a trust store
#[derive(Debug, Error)]
pub enum TlsError {
    /// The trust store could not be read
    #[error("could not read trust store {path}")]
    Read {
        /// Path of the trust store
        path: String,

        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// The trust store did not contain any usable certificate
    #[error("no valid certificate found in trust store {path}")]
    Empty {
        /// Path of the trust store
        path: String,
    },

    /// The certificate verifier could not be built from the trust store
    #[error("could not build a certificate verifier")]
    Verifier(#[from] VerifierBuilderError),

    /// The TLS client configuration could not be built
    #[error("could not build the TLS client configuration")]
    Config(#[from] RustlsError),
}

/// Verifies that the node certificate chains up to the trust store, without
/// matching its names against the node address
///
/// The driver connects to the address of each node of the cluster, and node
/// certificates rarely carry those addresses as subject alternative names.
#[derive(Debug)]
struct TrustStoreVerifier {
    inner: Arc<WebPkiServerVerifier>,
}

impl TrustStoreVerifier {
    fn new(
        roots: RootCertStore,
        provider: Arc<CryptoProvider>,
    ) -> Result<Self, VerifierBuilderError> {
        let inner = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider).build()?;
        Ok(Self { inner })
    }
}

impl ServerCertVerifier for TrustStoreVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, RustlsError> {
        match self.inner.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            ocsp_response,
            now,
        ) {
            // The name check happens after the chain was verified
            Err(RustlsError::InvalidCertificate(
                CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. },
            )) => Ok(ServerCertVerified::assertion()),
            res => res,
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, RustlsError> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, RustlsError> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

fn load_roots(path: &Utf8Path) -> Result<RootCertStore, TlsError> {
    let read_error = |source| TlsError::Read {
        path: path.to_string(),
        source,
    };

    let file = File::open(path).map_err(read_error)?;
    let mut reader = BufReader::new(file);
    let certificates = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_error)?;

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(certificates);
    if ignored > 0 {
        tracing::warn!(%path, ignored, "Ignored invalid certificates in trust store");
    }

    if added == 0 {
        return Err(TlsError::Empty {
            path: path.to_string(),
        });
    }

    Ok(roots)
}

/// Build a TLS client configuration which trusts the certificates of the given
/// PEM trust store
///
/// Node certificates must chain up to one of those certificates. Their names
/// are not checked against the address of the node.
///
/// # Errors
///
/// Returns an error if the file can't be read, if it holds no usable
/// certificate, or if the TLS configuration can't be built from it
pub fn client_config_from_trust_store(path: &Utf8Path) -> Result<Arc<ClientConfig>, TlsError> {
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let verifier = TrustStoreVerifier::new(load_roots(path)?, provider.clone())?;

    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();

    Ok(Arc::new(config))
}

#[cfg(test)]
mod tests {
    use std::net::IpAddr;

    use assert_matches::assert_matches;
    use camino::Utf8PathBuf;
    use rcgen::{
        BasicConstraints, Certificate, CertificateParams, ExtendedKeyUsagePurpose, IsCa, KeyPair,
    };

    use super::*;

    fn temp_dir(name: &str) -> Utf8PathBuf {
        let dir = std::env::temp_dir().join(format!("sweeper-tls-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        Utf8PathBuf::from_path_buf(dir).unwrap()
    }

    fn authority() -> (Certificate, KeyPair) {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let cert = params.self_signed(&key).unwrap();
        (cert, key)
    }

    /// A node certificate which only names the node by its DNS name
    fn node_certificate(ca: &Certificate, ca_key: &KeyPair) -> Certificate {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec!["cassandra01.example.com".to_owned()]).unwrap();
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
        params.signed_by(&key, ca, ca_key).unwrap()
    }

    fn verifier_trusting(ca: &Certificate) -> TrustStoreVerifier {
        let mut roots = RootCertStore::empty();
        roots.add(ca.der().clone()).unwrap();
        let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
        TrustStoreVerifier::new(roots, provider).unwrap()
    }

    fn node_address() -> ServerName<'static> {
        ServerName::from(IpAddr::from([10, 0, 0, 1]))
    }

    #[test]
    fn test_missing_trust_store() {
        let res = client_config_from_trust_store(Utf8Path::new("/this/does/not/exist.pem"));
        assert_matches!(res, Err(TlsError::Read { .. }));
    }

    #[test]
    fn test_empty_trust_store() {
        let dir = temp_dir("empty");
        let path = dir.join("empty.pem");
        std::fs::write(&path, "not a certificate\n").unwrap();

        let res = client_config_from_trust_store(&path);
        assert_matches!(res, Err(TlsError::Empty { .. }));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_trust_store_from_pem() {
        let (ca, _) = authority();
        let dir = temp_dir("pem");
        let path = dir.join("ca.pem");
        std::fs::write(&path, ca.pem()).unwrap();

        assert!(client_config_from_trust_store(&path).is_ok());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_node_address_is_not_matched() {
        let (ca, ca_key) = authority();
        let node = node_certificate(&ca, &ca_key);

        let res = verifier_trusting(&ca).verify_server_cert(
            node.der(),
            &[],
            &node_address(),
            &[],
            UnixTime::now(),
        );
        assert!(res.is_ok());
    }

    #[test]
    fn test_unknown_authority_is_rejected() {
        let (ca, _) = authority();
        let (other_ca, other_key) = authority();
        let node = node_certificate(&other_ca, &other_key);

        let res = verifier_trusting(&ca).verify_server_cert(
            node.der(),
            &[],
            &node_address(),
            &[],
            UnixTime::now(),
        );
        assert_matches!(
            res,
            Err(RustlsError::InvalidCertificate(CertificateError::UnknownIssuer))
        );
    }
}
