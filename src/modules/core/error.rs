//! Error types for cqlbridge

use thiserror::Error;

/// Main error type for cqlbridge operations
#[derive(Error, Debug)]
pub enum CqlError {
    /// Unsupported type mapping, invalid name or invalid configuration.
    /// Always raised before any I/O.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A query expression could not be compiled to CQL
    #[error("Render error: {0}")]
    Render(String),

    /// Connect, execute or shutdown failure reported by the transport
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CqlError {
    /// Returns true if this error came from the underlying session
    pub fn is_transport(&self) -> bool {
        matches!(self, CqlError::Transport(_))
    }

    /// Returns true if this error was raised before any I/O took place
    pub fn is_configuration(&self) -> bool {
        matches!(self, CqlError::Configuration(_))
    }

    /// Reclassify a formatter failure raised while compiling a statement
    pub fn into_render(self) -> Self {
        match self {
            CqlError::Configuration(msg) => CqlError::Render(msg),
            CqlError::Json(e) => CqlError::Render(e.to_string()),
            other => other,
        }
    }
}

/// Result type alias using CqlError
pub type Result<T> = std::result::Result<T, CqlError>;
