//! Client TLS configuration for dialing remote endpoints.

use std::{fs, path::Path, sync::Arc};

use anyhow::anyhow;
use rustls::{ClientConfig, RootCertStore};
use tracing::{debug, warn};

use super::{
    certificates::{load_client_identity, parse_ca_bundle, CertificateInfo},
    verifier::InsecureSkipServerVerification,
};
use crate::{config::TlsConfiguration, errors::TlsError};

/// A ready-to-use rustls client configuration plus what went into it.
///
/// Immutable once built. Rebuild it when the underlying files change.
#[derive(Debug, Clone)]
pub struct TlsClientConfig {
    config: Arc<ClientConfig>,
    client_identity: Option<CertificateInfo>,
    trust_anchors: usize,
    skip_server_verification: bool,
}

impl TlsClientConfig {
    pub fn client_config(&self) -> Arc<ClientConfig> {
        Arc::clone(&self.config)
    }

    /// Leaf metadata of the presented client certificate, if any.
    pub fn client_identity(&self) -> Option<&CertificateInfo> {
        self.client_identity.as_ref()
    }

    pub fn presents_client_certificate(&self) -> bool {
        self.client_identity.is_some()
    }

    pub fn verifies_server(&self) -> bool {
        !self.skip_server_verification
    }

    /// Number of CA certificates in the trust pool. Zero when verification is skipped.
    pub fn trust_anchor_count(&self) -> usize {
        self.trust_anchors
    }
}

/// Builds a [`TlsClientConfig`] from PEM bytes.
///
/// Presenting a client certificate and verifying the server are independent:
///
/// ```rust,ignore
/// let tls = TlsConfigBuilder::new()
///     .ca_certificate(&ca_pem)
///     .client_identity(&cert_pem, &key_pem)
///     .build()?;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TlsConfigBuilder<'a> {
    ca_cert: &'a [u8],
    cert: &'a [u8],
    key: &'a [u8],
    skip_client_verification: bool,
    skip_server_verification: bool,
}

impl<'a> TlsConfigBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// PEM bundle of CA certificates trusted when verifying the server.
    pub fn ca_certificate(mut self, pem: &'a [u8]) -> Self {
        self.ca_cert = pem;
        self
    }

    /// PEM certificate chain and private key presented to the server.
    pub fn client_identity(mut self, cert_pem: &'a [u8], key_pem: &'a [u8]) -> Self {
        self.cert = cert_pem;
        self.key = key_pem;
        self
    }

    /// Do not present a client certificate.
    pub fn skip_client_verification(mut self, skip: bool) -> Self {
        self.skip_client_verification = skip;
        self
    }

    /// Accept any server certificate. This removes the channel's protection
    /// against impersonation of the endpoint.
    pub fn danger_skip_server_verification(mut self, skip: bool) -> Self {
        self.skip_server_verification = skip;
        self
    }

    pub fn build(self) -> Result<TlsClientConfig, TlsError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());

        let identity = if self.skip_client_verification {
            None
        } else {
            Some(load_client_identity(self.cert, self.key)?)
        };

        let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()?;

        let (builder, trust_anchors) = if self.skip_server_verification {
            warn!("TLS server certificate verification disabled for this configuration");
            let verifier = InsecureSkipServerVerification::new(provider);
            (builder.dangerous().with_custom_certificate_verifier(Arc::new(verifier)), 0)
        } else {
            let roots = build_root_store(self.ca_cert);
            let count = roots.len();
            (builder.with_root_certificates(roots), count)
        };

        let (config, client_identity) = match identity {
            Some(identity) => {
                let config = builder
                    .with_client_auth_cert(identity.chain, identity.private_key)
                    .map_err(|err| TlsError::InvalidPrivateKey { source: Some(anyhow!(err)) })?;
                (config, Some(identity.info))
            }
            None => (builder.with_no_client_auth(), None),
        };

        debug!(
            client_certificate = client_identity.is_some(),
            verify_server = !self.skip_server_verification,
            trust_anchors,
            "Built TLS client configuration"
        );

        Ok(TlsClientConfig {
            config: Arc::new(config),
            client_identity,
            trust_anchors,
            skip_server_verification: self.skip_server_verification,
        })
    }
}

/// Build a client configuration from raw PEM bytes.
///
/// `skip_client_verification` omits the client certificate; `cert` and `key`
/// are then ignored. `skip_server_verification` accepts any server
/// certificate; `ca_cert` is then ignored.
pub fn create_tls_config(
    ca_cert: &[u8],
    cert: &[u8],
    key: &[u8],
    skip_client_verification: bool,
    skip_server_verification: bool,
) -> Result<TlsClientConfig, TlsError> {
    TlsConfigBuilder::new()
        .ca_certificate(ca_cert)
        .client_identity(cert, key)
        .skip_client_verification(skip_client_verification)
        .danger_skip_server_verification(skip_server_verification)
        .build()
}

/// Build a client configuration from an endpoint's TLS files on disk.
///
/// The client certificate is presented when TLS is enabled and both the
/// certificate and key paths are set. The CA bundle is required when TLS is
/// enabled and server verification is not skipped.
pub fn create_tls_configuration(settings: &TlsConfiguration) -> Result<TlsClientConfig, TlsError> {
    let identity = match (settings.tls, &settings.tls_cert_path, &settings.tls_key_path) {
        (true, Some(cert_path), Some(key_path)) => {
            let cert = read_file(cert_path, |path, source| TlsError::CertificateReadError {
                path,
                source,
            })?;
            let key = read_file(key_path, |path, source| TlsError::PrivateKeyReadError {
                path,
                source,
            })?;
            Some((cert, key))
        }
        _ => None,
    };

    let ca_cert = if settings.tls && !settings.tls_skip_verify {
        let path = settings.tls_ca_cert_path.as_ref().ok_or(TlsError::MissingCaCertificatePath)?;
        read_file(path, |path, source| TlsError::CaReadError { path, source })?
    } else {
        Vec::new()
    };

    let mut builder = TlsConfigBuilder::new()
        .ca_certificate(&ca_cert)
        .skip_client_verification(identity.is_none())
        .danger_skip_server_verification(settings.tls_skip_verify);
    if let Some((cert, key)) = &identity {
        builder = builder.client_identity(cert, key);
    }

    builder.build()
}

fn build_root_store(ca_pem: &[u8]) -> RootCertStore {
    let bundle = parse_ca_bundle(ca_pem);
    let mut roots = RootCertStore::empty();
    let (_, rejected) = roots.add_parsable_certificates(bundle.certificates);

    let skipped = bundle.skipped + rejected;
    if skipped > 0 {
        warn!(skipped, accepted = roots.len(), "Ignored malformed entries in CA bundle");
    }

    roots
}

fn read_file(
    path: &Path,
    to_error: impl FnOnce(std::path::PathBuf, std::io::Error) -> TlsError,
) -> Result<Vec<u8>, TlsError> {
    fs::read(path).map_err(|source| to_error(path.to_path_buf(), source))
}
