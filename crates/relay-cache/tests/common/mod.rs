#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use relay_cache::{BackendError, CacheBackend, CacheResult, MemoryBackend, SearchHit};
use relay_data::{ApiRequest, Method, Transport, TransportError};
use serde_json::{json, Value};

/// Transport that records every call and answers from a table.
#[derive(Default)]
pub struct MockTransport {
    calls: Mutex<Vec<ApiRequest>>,
    responses: Mutex<HashMap<(Method, String), Result<Value, TransportError>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, path: &str, result: Result<Value, TransportError>) {
        self.responses
            .lock()
            .unwrap()
            .insert((method, path.to_string()), result);
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn count_for(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.resource_path == path)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn invoke(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(request.clone());
            calls.len()
        };
        let configured = self
            .responses
            .lock()
            .unwrap()
            .get(&(request.method, request.resource_path.clone()))
            .cloned();
        configured.unwrap_or_else(|| {
            Ok(json!({
                "method": request.method.as_str(),
                "path": request.resource_path,
                "call": n,
            }))
        })
    }
}

/// Memory backend that remembers the TTL of every store.
#[derive(Default)]
pub struct RecordingBackend {
    pub inner: MemoryBackend,
    stores: Mutex<Vec<(String, Duration)>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored_ttls(&self) -> Vec<Duration> {
        self.stores.lock().unwrap().iter().map(|(_, ttl)| *ttl).collect()
    }
}

#[async_trait]
impl CacheBackend for RecordingBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()> {
        self.stores.lock().unwrap().push((key.to_string(), ttl));
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        self.inner.delete(key).await
    }

    async fn search(&self, prefix: &str) -> CacheResult<Vec<SearchHit>> {
        self.inner.search(prefix).await
    }
}

/// Backend whose selected operations always fail.
#[derive(Default)]
pub struct FailingBackend {
    pub inner: MemoryBackend,
    pub fail_get: bool,
    pub fail_set: bool,
    pub fail_delete: bool,
    pub fail_search: bool,
}

impl FailingBackend {
    pub fn all() -> Self {
        Self {
            inner: MemoryBackend::new(),
            fail_get: true,
            fail_set: true,
            fail_delete: true,
            fail_search: true,
        }
    }

    fn down() -> BackendError {
        BackendError::Unavailable("connection refused".to_string())
    }
}

#[async_trait]
impl CacheBackend for FailingBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        if self.fail_get {
            return Err(Self::down());
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()> {
        if self.fail_set {
            return Err(Self::down());
        }
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        if self.fail_delete {
            return Err(Self::down());
        }
        self.inner.delete(key).await
    }

    async fn search(&self, prefix: &str) -> CacheResult<Vec<SearchHit>> {
        if self.fail_search {
            return Err(Self::down());
        }
        self.inner.search(prefix).await
    }
}

pub fn memory() -> Arc<MemoryBackend> {
    Arc::new(MemoryBackend::new())
}
