//! Error types for Flux Nova
//!
//! This module defines all error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Flux Nova operations
///
/// Covers configuration loading, backend calls, credential storage and
/// image payload handling. The snap viewer swallows most of these (a failed
/// poll or open degrades to a no-op), while the CLI surfaces them.
#[derive(Error, Debug)]
pub enum FluxNovaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backend could not be reached (connect failure, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status
    #[error("Backend returned {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message extracted from the error body, or the raw body
        message: String,
    },

    /// The backend rejected our credentials (401/403)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// No stored session; the user has to log in first
    #[error("Not logged in; run `fluxnova login` first")]
    NotAuthenticated,

    /// A success response did not carry the expected fields
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// No user matched a lookup
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Image payload could not be read, detected or decoded
    #[error("Media error: {0}")]
    Media(String),

    /// Invalid user input (duration out of range, empty recipient list)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl FluxNovaError {
    /// Build the error for a non-success response.
    ///
    /// 401 and 403 map to [`FluxNovaError::Authentication`]; everything else
    /// keeps the status code.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => FluxNovaError::Authentication(message),
            _ => FluxNovaError::Status { status, message },
        }
    }
}

/// Result type alias for Flux Nova operations
///
/// Uses `anyhow::Error` as the error type so callers can attach context
/// while still downcasting to [`FluxNovaError`] when they need to branch.
pub type Result<T> = anyhow::Result<T>;
