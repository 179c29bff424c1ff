//! Error types for the Zep memory integration
//!
//! This module provides structured error definitions using thiserror. A session
//! that does not exist is never an error here: the backend reports it as `None`.

use thiserror::Error;

/// Main error type for memory operations
#[derive(Error, Debug)]
pub enum MemoryError {
    /// Startup configuration is missing or invalid
    #[error("{0}")]
    Configuration(String),

    /// Configuration source could not be read
    #[error("Configuration error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    /// Argument rejected before any remote call
    #[error("{0}")]
    InvalidArgument(String),

    /// Tool name not present in the catalog
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Remote API answered with a non-success status
    #[error("Remote API error ({status}): {message}")]
    RemoteFailure { status: u16, message: String },

    /// HTTP transport to the remote API failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Appending a message failed
    #[error("Error adding memory: {0}")]
    MemoryWrite(String),

    /// Fetching the memory context failed
    #[error("Error retrieving memory: {0}")]
    MemoryRetrieval(String),

    /// Plugin credentials were rejected
    #[error("Credential validation failed: {0}")]
    CredentialValidation(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for memory operations
pub type Result<T> = std::result::Result<T, MemoryError>;

impl MemoryError {
    /// Stable machine-readable tag for this error
    pub fn error_kind(&self) -> &'static str {
        match self {
            MemoryError::Configuration(_) | MemoryError::ConfigSource(_) => "CONFIGURATION_ERROR",
            MemoryError::InvalidArgument(_) => "INVALID_ARGUMENT",
            MemoryError::UnknownTool(_) => "UNKNOWN_TOOL",
            MemoryError::RemoteFailure { .. } | MemoryError::Http(_) => "REMOTE_FAILURE",
            MemoryError::MemoryWrite(_) => "MEMORY_WRITE_FAILURE",
            MemoryError::MemoryRetrieval(_) => "MEMORY_RETRIEVAL_FAILURE",
            MemoryError::CredentialValidation(_) => "CREDENTIAL_VALIDATION_ERROR",
            MemoryError::Io(_) | MemoryError::Serialization(_) => "INTERNAL_ERROR",
        }
    }

    /// True for errors raised before any remote call was made
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MemoryError::InvalidArgument(_) | MemoryError::UnknownTool(_)
        )
    }
}
