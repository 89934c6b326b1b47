//! # TLS Client Configuration
//!
//! Builds rustls client configurations for connecting to remote endpoints from
//! PEM material held in memory or in the artifact store.
//!
//! Client certificate presentation and server certificate verification are
//! independent switches. When server verification is skipped the handshake
//! accepts any server certificate, which removes protection against endpoint
//! impersonation.

pub mod certificates;
pub mod tls;
pub mod verifier;

pub use certificates::{CertificateInfo, ClientIdentity};
pub use tls::{create_tls_config, create_tls_configuration, TlsClientConfig, TlsConfigBuilder};
pub use verifier::InsecureSkipServerVerification;
