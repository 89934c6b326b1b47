//! # Artifact Store
//!
//! Namespaced on-disk persistence for security-sensitive material:
//!
//! ```text
//! <data root>/
//!   portainer.key, portainer.pub      instance key pair (single PEM block each)
//!   <file root>/
//!     tls/<folder>/{ca,cert,key}.pem  per-endpoint TLS material
//!     compose/<stack id>/<file>       stack definitions
//! ```
//!
//! TLS file names come only from [`TlsFileKind`], never from callers.

pub mod paths;
pub mod pem_file;
mod store;

pub use paths::{TlsFileKind, COMPOSE_FILE_DEFAULT_NAME, LDAP_STORE_PATH};
pub use store::FileService;
