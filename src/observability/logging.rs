//! # Structured Logging
//!
//! Subscriber setup and span macros built on the tracing ecosystem.
//!
//! `RUST_LOG` takes precedence over the configured level when set. JSON output
//! puts span fields such as `operation` and `folder` on every event.

use tracing_subscriber::EnvFilter;

use crate::{config::LoggingConfig, errors::Result};

/// Create a tracing span for artifact store operations.
///
/// ```rust,ignore
/// let _guard = artifact_span!("store_tls_file", folder = %folder).entered();
/// ```
#[macro_export]
macro_rules! artifact_span {
    ($operation:expr) => {
        ::tracing::debug_span!("artifact_operation", operation = %$operation)
    };
    ($operation:expr, $($field:tt)*) => {
        ::tracing::debug_span!("artifact_operation", operation = %$operation, $($field)*)
    };
}

/// Install the global fmt subscriber.
///
/// Returns an error only for an unparsable level. A subscriber that is already
/// installed is left in place.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|err| {
            crate::Error::config(format!("Invalid log level '{}': {}", config.level, err))
        })?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        tracing::debug!(level = %config.level, json = config.json, "Logging initialised");
    }
    Ok(())
}
