//! # Trustkeep
//!
//! Storage and TLS plumbing for a container management server:
//!
//! - an [artifact store](filesystem) that keeps per-endpoint TLS material,
//!   stack definitions, JSON documents and the instance key pair under a data
//!   directory
//! - a [TLS builder](crypto) that turns PEM material into a rustls client
//!   configuration, with independent control over client certificate
//!   presentation and server certificate verification
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use trustkeep::{
//!     create_tls_configuration, FileService, StoreConfig, TlsConfiguration, TlsFileKind,
//! };
//!
//! fn main() -> trustkeep::Result<()> {
//!     let store = FileService::from_config(&StoreConfig::from_env()?)?;
//!     store.store_tls_file("endpoint-1", TlsFileKind::Ca, &b"-----BEGIN CERTIFICATE-----"[..])?;
//!
//!     let settings = TlsConfiguration::from_store(&store, "endpoint-1", false)?;
//!     let tls = create_tls_configuration(&settings)?;
//!     let _client_config = tls.client_config();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crypto;
pub mod errors;
pub mod filesystem;
pub mod observability;

// Re-export commonly used types and functions
pub use config::{LoggingConfig, StoreConfig, TlsConfiguration};
pub use crypto::{
    create_tls_config, create_tls_configuration, TlsClientConfig, TlsConfigBuilder,
};
pub use errors::{Error, Result, StoreError, TlsError};
pub use filesystem::{FileService, TlsFileKind};
pub use observability::init_logging;

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
