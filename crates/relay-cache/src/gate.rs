//! Read-through caching for `GET` calls.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use relay_data::TransportError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::CacheBackend;
use crate::key::CacheKey;
use crate::stats::CacheStats;
use crate::ttl::TtlPolicy;

/// How a call was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Served from cache.
    Hit,
    /// Fetched from the transport and stored.
    Miss,
    /// Not cacheable; passed straight through.
    Bypass,
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hit => write!(f, "HIT"),
            Self::Miss => write!(f, "MISS"),
            Self::Bypass => write!(f, "BYPASS"),
        }
    }
}

/// Serves reads from the backend and populates it on miss.
///
/// There is no stampede protection: concurrent misses on one key each call
/// the transport and each store, the last store wins.
pub struct ReadThroughGate {
    backend: Arc<dyn CacheBackend>,
    stats: Arc<CacheStats>,
}

impl ReadThroughGate {
    /// Create a gate over `backend`.
    pub fn new(backend: Arc<dyn CacheBackend>, stats: Arc<CacheStats>) -> Self {
        Self { backend, stats }
    }

    /// Return the cached value for `key`, or call `transport_call` and cache
    /// its result with the TTL taken from `ttl`.
    ///
    /// Transport errors are returned unchanged and nothing is cached. Backend
    /// errors never fail the call: a failed read counts as a miss and a failed
    /// store is only logged.
    pub async fn fetch<F, Fut>(
        &self,
        key: &CacheKey,
        ttl: &TtlPolicy,
        transport_call: F,
    ) -> Result<(Value, CacheStatus), TransportError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, TransportError>>,
    {
        self.fetch_with_ttl(key, ttl, None, transport_call).await
    }

    /// Like [`fetch`](Self::fetch), but a miss is stored with `call_ttl` when
    /// given. The policy's pending override is then left untouched.
    pub async fn fetch_with_ttl<F, Fut>(
        &self,
        key: &CacheKey,
        ttl: &TtlPolicy,
        call_ttl: Option<Duration>,
        transport_call: F,
    ) -> Result<(Value, CacheStatus), TransportError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, TransportError>>,
    {
        match self.backend.get(key.as_str()).await {
            Ok(Some(value)) => {
                self.stats.record_hit();
                debug!(key = %key, "cache hit");
                return Ok((value, CacheStatus::Hit));
            }
            Ok(None) => {}
            Err(e) => {
                self.stats.record_backend_error();
                warn!(key = %key, error = %e, "cache read failed, treating as miss");
            }
        }

        self.stats.record_miss();
        let result = transport_call().await?;

        let (ttl, overridden) = match call_ttl {
            Some(call_ttl) => (call_ttl, true),
            None => ttl.ttl_for_next_write(),
        };
        match self.backend.set(key.as_str(), result.clone(), ttl).await {
            Ok(()) => {
                self.stats.record_store();
                debug!(
                    key = %key,
                    ttl_secs = ttl.as_secs(),
                    overridden,
                    "cache miss, stored"
                );
            }
            Err(e) => {
                self.stats.record_backend_error();
                warn!(key = %key, error = %e, "cache store failed");
            }
        }

        Ok((result, CacheStatus::Miss))
    }
}
