//! Cache and proxy error types.

use relay_data::TransportError;
use thiserror::Error;

/// Result type for backend operations.
pub type CacheResult<T> = Result<T, BackendError>;

/// Errors reported by a [`CacheBackend`](crate::CacheBackend).
///
/// The proxy treats every one of these as recoverable: a failed read is a
/// miss, a failed store or delete is logged and skipped.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Backend could not be reached or opened.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Failed to serialize/deserialize a cached value.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend storage operation failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Backend does not support searching stored keys.
    #[error("search not supported: {0}")]
    SearchUnsupported(String),
}

/// A resource path that cannot be turned into a cache key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Path is empty.
    #[error("resource path is empty")]
    Empty,

    /// Path carries a query string or fragment.
    #[error("resource path must not contain '{0}': {1}")]
    ForbiddenChar(char, String),

    /// Path contains whitespace or control characters.
    #[error("resource path contains whitespace or control characters: {0:?}")]
    Unprintable(String),
}

/// Errors surfaced by [`CachingClient::call_api`](crate::CachingClient::call_api).
#[derive(Error, Debug)]
pub enum ProxyError {
    /// The transport failed. Passed through verbatim.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request's resource path is malformed.
    #[error("invalid resource path: {0}")]
    InvalidPath(#[from] PathError),
}

impl ProxyError {
    /// The underlying transport error, if this is one.
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(e) => Some(e),
            Self::InvalidPath(_) => None,
        }
    }
}
