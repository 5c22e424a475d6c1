//! Store error types

use thiserror::Error;

/// Upload-related errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Credentials rejected by the service
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// API error from the service
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// File to upload is missing or unreadable
    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
