//! # Configuration Management
//!
//! Store roots and logging settings, loaded from environment variables.

pub mod tls;

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::Result;

pub use tls::TlsConfiguration;

const DEFAULT_DATA_PATH: &str = "/data";
const DEFAULT_FILE_STORE_NAME: &str = "storage";

/// Location of the artifact store on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StoreConfig {
    /// Data root holding the instance key pair and the file store.
    #[validate(length(min = 1, message = "Data path cannot be empty"))]
    pub data_path: String,

    /// Name of the file store directory inside the data root.
    #[validate(custom(function = "validate_store_name"))]
    pub file_store_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_path: DEFAULT_DATA_PATH.to_string(),
            file_store_name: DEFAULT_FILE_STORE_NAME.to_string(),
        }
    }
}

impl StoreConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let data_path = env_or("TRUSTKEEP_DATA_PATH", DEFAULT_DATA_PATH);
        let file_store_name = env_or("TRUSTKEEP_FILE_STORE_NAME", DEFAULT_FILE_STORE_NAME);

        let config = Self { data_path, file_store_name };
        config.validate()?;
        Ok(config)
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_path)
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,

    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let level = env_or("TRUSTKEEP_LOG_LEVEL", "info");
        let json = std::env::var("TRUSTKEEP_LOG_JSON")
            .ok()
            .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Self { level, json }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn validate_store_name(name: &str) -> std::result::Result<(), ValidationError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(ValidationError::new("invalid_file_store_name")),
    }
}
