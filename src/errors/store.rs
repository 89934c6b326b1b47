//! Error types for artifact store operations.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for artifact store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while reading or writing stored artifacts.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The artifact kind is not one of the supported TLS file kinds.
    #[error("Unsupported artifact kind: {kind}")]
    UnsupportedArtifactKind { kind: String },

    /// A folder key, stack identifier or file name would escape its namespace.
    #[error("Invalid artifact name '{name}': {reason}")]
    InvalidArtifactName { name: String, reason: String },

    /// The artifact does not exist on disk.
    #[error("Artifact not found: {path}")]
    NotFound { path: PathBuf },

    /// Filesystem failure.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The value could not be encoded as JSON.
    #[error("Serialization error for {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The file does not hold exactly one well-formed PEM block.
    #[error("Corrupt PEM file {path}: {reason}")]
    CorruptPem { path: PathBuf, reason: String },

    /// The PEM block label differs from the one the caller expects.
    #[error("PEM label mismatch in {path}: expected '{expected}', found '{found}'")]
    PemLabelMismatch { path: PathBuf, expected: String, found: String },
}

impl StoreError {
    /// Create an unsupported artifact kind error.
    pub fn unsupported_kind(kind: impl ToString) -> Self {
        Self::UnsupportedArtifactKind { kind: kind.to_string() }
    }

    /// Create an invalid artifact name error.
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArtifactName { name: name.into(), reason: reason.into() }
    }

    /// Map an I/O error, turning `NotFound` into [`StoreError::NotFound`].
    pub fn from_io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path: path.to_path_buf() }
        } else {
            Self::Io { path: path.to_path_buf(), source }
        }
    }

    /// Create a corrupt PEM error.
    pub fn corrupt_pem(path: &Path, reason: impl Into<String>) -> Self {
        Self::CorruptPem { path: path.to_path_buf(), reason: reason.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
