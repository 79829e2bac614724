//! Errors for HTTP provider adapters.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when calling an embedding or generation backend.
#[derive(Error, Debug)]
pub enum ProviderApiError {
    /// Invalid request parameters (HTTP 400)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid or missing API key (HTTP 401)
    #[error("Invalid API key - authentication failed")]
    InvalidApiKey,

    /// Forbidden - permission denied (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (HTTP 404)
    #[error("Resource not found")]
    NotFound,

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded - too many requests")]
    RateLimitExceeded,

    /// Server error (HTTP 500, 502, 503, 504, 529)
    #[error("Server error ({0}): {1}")]
    ServerError(StatusCode, String),

    /// Network or connection error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Response body could not be parsed
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Unknown or unexpected error
    #[error("Unknown error ({0}): {1}")]
    UnknownError(StatusCode, String),
}

impl ProviderApiError {
    /// Returns true if this error is transient and should be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderApiError::RateLimitExceeded
            | ProviderApiError::ServerError(_, _)
            | ProviderApiError::Timeout => true,
            ProviderApiError::NetworkError(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }

    /// Classify an unsuccessful HTTP status.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST => ProviderApiError::InvalidRequest(body),
            StatusCode::UNAUTHORIZED => ProviderApiError::InvalidApiKey,
            StatusCode::FORBIDDEN => ProviderApiError::Forbidden(body),
            StatusCode::NOT_FOUND => ProviderApiError::NotFound,
            StatusCode::TOO_MANY_REQUESTS => ProviderApiError::RateLimitExceeded,
            s if s.is_server_error() || s.as_u16() == 529 => {
                ProviderApiError::ServerError(s, body)
            }
            s => ProviderApiError::UnknownError(s, body),
        }
    }
}
