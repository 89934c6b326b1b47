use std::path::PathBuf;

use thiserror::Error;

/// TLS-specific error variants surfaced while building a client configuration.
#[derive(Debug, Error)]
pub enum TlsError {
    /// The certificate file could not be read.
    #[error("Failed to read certificate at {path}: {source}")]
    CertificateReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The private key file could not be read.
    #[error("Failed to read private key at {path}: {source}")]
    PrivateKeyReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CA bundle could not be read.
    #[error("Failed to read CA certificate at {path}: {source}")]
    CaReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Server verification is enabled but no CA bundle path was configured.
    #[error("TLS server verification is enabled but CA certificate path is not configured")]
    MissingCaCertificatePath,

    /// No certificates were found in the supplied PEM data.
    #[error("Client certificate does not contain any certificates")]
    EmptyCertificateChain,

    /// The certificate PEM contents were invalid or unreadable.
    #[error("Client certificate is not a valid PEM: {source}")]
    InvalidCertificatePem {
        #[source]
        source: anyhow::Error,
    },

    /// The private key PEM contents were invalid or unsupported.
    #[error("Client key does not contain a supported private key")]
    InvalidPrivateKey {
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The supplied certificate and key do not match.
    #[error("Certificate and private key do not match")]
    CertificateKeyMismatch,

    /// Leaf certificate metadata could not be extracted.
    #[error("Failed to extract certificate metadata: {source}")]
    CertificateMetadata {
        #[source]
        source: anyhow::Error,
    },

    /// rustls rejected the assembled configuration.
    #[error("TLS configuration rejected: {0}")]
    Rustls(#[from] rustls::Error),
}

impl TlsError {
    /// True for failures caused by malformed or mismatched certificate input.
    pub fn is_invalid_certificate(&self) -> bool {
        matches!(
            self,
            Self::EmptyCertificateChain
                | Self::InvalidCertificatePem { .. }
                | Self::InvalidPrivateKey { .. }
                | Self::CertificateKeyMismatch
                | Self::CertificateMetadata { .. }
        )
    }
}
