//! Cache backend contract.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CacheResult;

/// A stored key returned by [`CacheBackend::search`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// The stored key.
    pub key: String,
    /// Unix timestamp (seconds) at which the entry expires, if it does.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl SearchHit {
    /// Create a hit for `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            expires_at: None,
        }
    }

    /// Set the expiry timestamp.
    pub fn with_expiry(mut self, expires_at: u64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

/// Key-value storage the proxy caches into.
///
/// Backends are shared between proxies and must synchronize internally.
/// Besides get/set/delete they must support searching stored keys by
/// prefix, which the invalidator relies on.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a cached value.
    ///
    /// `Ok(None)` means absent. A stored JSON `null` comes back as
    /// `Ok(Some(Value::Null))`.
    async fn get(&self, key: &str) -> CacheResult<Option<Value>>;

    /// Store a value. A zero `ttl` stores without expiry.
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()>;

    /// Delete a value. Returns whether the key was present.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Every live key starting with `prefix`.
    async fn search(&self, prefix: &str) -> CacheResult<Vec<SearchHit>>;
}

#[async_trait]
impl<B: CacheBackend + ?Sized> CacheBackend for Arc<B> {
    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()> {
        (**self).set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        (**self).delete(key).await
    }

    async fn search(&self, prefix: &str) -> CacheResult<Vec<SearchHit>> {
        (**self).search(prefix).await
    }
}
