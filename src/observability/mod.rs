//! # Observability
//!
//! Structured logging for the artifact store and TLS builder. Library code only
//! emits `tracing` events; installing a subscriber is left to the embedding
//! process through [`init_logging`].

pub mod logging;

pub use logging::init_logging;
