//! Store error types

use thiserror::Error;

/// Version source errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// API error from store
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// App not found
    #[error("App not found: {0}")]
    AppNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Response did not carry a usable version
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
