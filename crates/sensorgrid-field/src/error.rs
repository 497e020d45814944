//! Error types for the field runtime.

use thiserror::Error;

use crate::config::ConfigError;

/// Result type for field operations.
pub type Result<T> = std::result::Result<T, FieldError>;

/// Errors that can end a run.
#[derive(Debug, Error)]
pub enum FieldError {
    /// Configuration rejected before start
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A unit hit a protocol fault
    #[error("protocol error: {0}")]
    Protocol(#[from] sensorgrid_protocols::Error),

    /// A unit panicked or was cancelled
    #[error("execution unit failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Writing reports failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding a report failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
