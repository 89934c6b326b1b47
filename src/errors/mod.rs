//! # Error Handling
//!
//! Error types for the credential and artifact store, defined with `thiserror`.
//! Store and TLS failures keep their own enums so callers can branch on the
//! precise cause; [`Error`] wraps both for code that does not care.

mod store;
mod tls;

pub use store::{StoreError, StoreResult};
pub use tls::TlsError;

/// Custom result type for trustkeep operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for trustkeep
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Artifact store errors
    #[error(transparent)]
    Store(#[from] StoreError),

    /// TLS configuration errors
    #[error("TLS configuration error: {0}")]
    Tls(#[from] TlsError),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Config(errors.to_string())
    }
}
