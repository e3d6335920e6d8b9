//! The caching proxy.

use std::sync::Arc;
use std::time::Duration;

use relay_data::{ApiRequest, Transport};
use serde_json::Value;
use tracing::debug;

use crate::backend::CacheBackend;
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::gate::{CacheStatus, ReadThroughGate};
use crate::invalidate::{InvalidationReport, Invalidator};
use crate::key::{CacheKey, CacheKeyBuilder};
use crate::memory::MemoryBackend;
use crate::path::ResourcePath;
use crate::stats::{CacheStats, CacheStatsSnapshot};
use crate::ttl::TtlPolicy;

/// A transport wrapped with read-through caching.
///
/// `GET` calls are answered from the backend when possible. Every other
/// method first deletes the cached reads it may have made stale, then goes
/// to the transport; its result is never cached.
///
/// The TTL override set by [`set_temporary_ttl`](Self::set_temporary_ttl)
/// is consumed by whichever call stores next, so callers sharing one client
/// must treat "set override, then call" as a critical section.
pub struct CachingClient<T> {
    transport: T,
    backend: Arc<dyn CacheBackend>,
    ttl: TtlPolicy,
    gate: ReadThroughGate,
    invalidator: Invalidator,
    stats: Arc<CacheStats>,
}

impl<T: Transport> CachingClient<T> {
    /// Wrap `transport`, caching into `backend` with the default config.
    pub fn new(transport: T, backend: Arc<dyn CacheBackend>) -> Self {
        Self::from_config(transport, Some(backend), &ProxyConfig::default())
    }

    /// Wrap `transport` with a fresh in-memory backend.
    pub fn with_memory_backend(transport: T) -> Self {
        Self::from_config(transport, None, &ProxyConfig::default())
    }

    /// Build from a config. Without a backend an in-memory one is created.
    pub fn from_config(
        transport: T,
        backend: Option<Arc<dyn CacheBackend>>,
        config: &ProxyConfig,
    ) -> Self {
        let backend = backend.unwrap_or_else(|| Arc::new(MemoryBackend::new()));
        let stats = Arc::new(CacheStats::new());

        Self {
            gate: ReadThroughGate::new(backend.clone(), stats.clone()),
            invalidator: Invalidator::new(backend.clone(), stats.clone())
                .with_floor(config.invalidation_floor)
                .with_delete_failures(config.delete_failures)
                .with_segment_boundary(config.match_segment_boundary),
            ttl: TtlPolicy::new(config.default_ttl()),
            transport,
            backend,
            stats,
        }
    }

    /// Use `ttl` for the next cached read only.
    pub fn set_temporary_ttl(&self, ttl: Duration) {
        self.ttl.set_override(ttl);
    }

    /// Perform `request`, through the cache when it is a read.
    pub async fn call_api(&self, request: ApiRequest) -> Result<Value, ProxyError> {
        self.call_api_with_status(request)
            .await
            .map(|(value, _)| value)
    }

    /// Like [`call_api`](Self::call_api), also reporting how the call was
    /// answered.
    pub async fn call_api_with_status(
        &self,
        request: ApiRequest,
    ) -> Result<(Value, CacheStatus), ProxyError> {
        self.execute(request, None).await
    }

    /// Perform `request`, storing a read miss with `ttl` when given.
    ///
    /// Unlike [`set_temporary_ttl`](Self::set_temporary_ttl) the TTL is bound
    /// to this call: a hit or a failed call leaves nothing behind, and a
    /// pending override stays pending for the next store.
    pub async fn call_api_with_ttl(
        &self,
        request: ApiRequest,
        ttl: Option<Duration>,
    ) -> Result<(Value, CacheStatus), ProxyError> {
        self.execute(request, ttl).await
    }

    async fn execute(
        &self,
        request: ApiRequest,
        call_ttl: Option<Duration>,
    ) -> Result<(Value, CacheStatus), ProxyError> {
        let path = ResourcePath::parse(&request.resource_path)?;

        if request.method.is_read() {
            let key = CacheKeyBuilder::from_request(&request, &path).build();
            let transport = &self.transport;
            let request = &request;
            let result = self
                .gate
                .fetch_with_ttl(&key, &self.ttl, call_ttl, || transport.invoke(request))
                .await?;
            return Ok(result);
        }

        debug!(method = %request.method, path = %path, "passing write through");
        self.stats.record_write();
        let transport = &self.transport;
        let request = &request;
        let value = self
            .invalidator
            .write_through(&path, || transport.invoke(request))
            .await?;
        Ok((value, CacheStatus::Bypass))
    }

    /// Run invalidation for a write at `resource_path` without calling the
    /// transport.
    pub async fn invalidate(&self, resource_path: &str) -> Result<InvalidationReport, ProxyError> {
        let path = ResourcePath::parse(resource_path)?;
        Ok(self.invalidator.invalidate(&path).await)
    }

    /// The cache key `request` would be stored under.
    pub fn cache_key(&self, request: &ApiRequest) -> Result<CacheKey, ProxyError> {
        Ok(CacheKey::for_request(request)?)
    }

    /// The wrapped transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The shared cache backend.
    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    /// The TTL policy.
    pub fn ttl_policy(&self) -> &TtlPolicy {
        &self.ttl
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }
}
