//! Error types for the client library
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == API Error Enum ==
/// Error surfaced to callers of the client and its services.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Invalid client options, raised at construction and never retried
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Caller-side argument rejected before any request was issued
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Non-success status below 500, never retried
    #[error("{message}")]
    Client { status: u16, message: String },

    /// 5xx status after the retry budget was spent
    #[error("{message}")]
    Server { status: u16, message: String },

    /// Connection or body-read failure after the retry budget was spent
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Request timed out after the retry budget was spent
    #[error("Request timed out: {message}")]
    Timeout { message: String },

    /// Malformed response body or unencodable request body
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The client's cancellation token fired
    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    // == Status Classification ==
    /// Builds the classified error for a non-success HTTP status.
    ///
    /// The message is derived from the status and carries the response body
    /// so callers see what the API returned.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = format!("{} Response: {}", status_message(status), body);
        if status >= 500 {
            ApiError::Server { status, message }
        } else {
            ApiError::Client { status, message }
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Client { status, .. } | ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the request executor may attempt the call again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Server { .. } | ApiError::Transport { .. } | ApiError::Timeout { .. }
        )
    }

    /// Whether the API reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Human-readable message for a failed status code.
pub fn status_message(status: u16) -> String {
    match status {
        401 => "Authentication failed. Please check your API key and secret.".to_string(),
        403 => "Access forbidden. You don't have permission to access this resource.".to_string(),
        404 => "Resource not found.".to_string(),
        429 => "Rate limit exceeded. Please try again later.".to_string(),
        s if s >= 500 => "Server error occurred. Please try again later.".to_string(),
        s => format!("HTTP request failed with status {}", s),
    }
}

// == Cache Error Enum ==
/// Failure inside a cache backend.
///
/// Never leaves the cache layer: stores log it and degrade to a miss/no-op.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend could not be reached
    #[error("Cache connection error: {0}")]
    Connection(String),

    /// Backend rejected or failed the command
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// Invalid wildcard pattern
    #[error("Invalid cache pattern: {0}")]
    InvalidPattern(String),
}

// == Result Type Aliases ==
/// Convenience Result type for client operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Result type for cache backend operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;
