//! Transport error types.

use thiserror::Error;

/// Errors raised by a [`Transport`](crate::Transport) while performing a call.
///
/// The caching layer never inspects or rewrites these; they reach the caller
/// exactly as the transport produced them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Failed to send the request.
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Non-2xx response from the remote API.
    #[error("HTTP {status}: {message}")]
    HttpError { status: u16, message: String },

    /// Failed to deserialize the response into the expected type.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Request timeout.
    #[error("Request timed out")]
    Timeout,

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(String),
}

impl TransportError {
    /// HTTP status of the failure, if the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        TransportError::JsonError(e.to_string())
    }
}
