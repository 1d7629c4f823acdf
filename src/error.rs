//! Error types for the drivetools library.

use thiserror::Error;

/// Main error type for drivetools operations.
#[derive(Error, Debug)]
pub enum DriveError {
    /// HTTP request failed with status code.
    #[error("HTTP error: {0}")]
    HttpError(u16),

    /// Network request error.
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Server kept answering with transient errors until retries ran out.
    #[error("Server busy, try again later")]
    ServerBusy,

    /// A single request attempt exceeded the configured timeout.
    #[error("HTTP request timed out")]
    Timeout,

    /// Invalid or unexpected response from server.
    #[error("Invalid response from server")]
    InvalidResponse,

    /// Drive API returned a structured error.
    #[error("API error: {code} {reason} - {message}")]
    Api {
        code: u16,
        reason: String,
        message: String,
    },

    /// Item does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The batch carrying this item could not be submitted.
    #[error("Batch rejected: {0}")]
    BatchRejected(String),

    /// Caller passed arguments that cannot work.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Custom error message.
    #[error("{0}")]
    Custom(String),
}

impl DriveError {
    /// Whether the error means the addressed item does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            DriveError::NotFound(_) => true,
            DriveError::Api { code, .. } => *code == 404,
            DriveError::HttpError(status) => *status == 404,
            _ => false,
        }
    }
}

/// Result type alias for drivetools operations.
pub type Result<T> = std::result::Result<T, DriveError>;
