//! In-process cache backend.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;

use crate::backend::{CacheBackend, SearchHit};
use crate::error::CacheResult;
use crate::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::memory";

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    deadline: Option<Instant>,
    expires_at: Option<u64>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

/// Ordered in-memory backend.
///
/// Keys live in a `BTreeMap`, so prefix search is a range scan rather than a
/// walk over every entry. Expired entries are dropped lazily when they are
/// read or searched, or eagerly via [`purge_expired`](Self::purge_expired).
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including ones that expired but were not yet
    /// dropped.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` is stored and live.
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        rw_read(&self.entries, SOURCE, "contains")
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Drop every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "purge_expired");
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Remove everything.
    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        let now = Instant::now();
        {
            let entries = rw_read(&self.entries, SOURCE, "get");
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        let mut entries = rw_write(&self.entries, SOURCE, "get.expire");
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()> {
        let (deadline, expires_at) = if ttl.is_zero() {
            (None, None)
        } else {
            (
                Some(Instant::now() + ttl),
                Some(current_timestamp().saturating_add(ttl.as_secs())),
            )
        };

        rw_write(&self.entries, SOURCE, "set").insert(
            key.to_string(),
            Entry {
                value,
                deadline,
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        Ok(rw_write(&self.entries, SOURCE, "delete").remove(key).is_some())
    }

    async fn search(&self, prefix: &str) -> CacheResult<Vec<SearchHit>> {
        let now = Instant::now();
        let entries = rw_read(&self.entries, SOURCE, "search");

        let hits = entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, entry)| SearchHit {
                key: key.clone(),
                expires_at: entry.expires_at,
            })
            .collect();

        Ok(hits)
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_get_set_delete() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("a").await.unwrap(), None);

        backend.set("a", json!({"id": 1}), TTL).await.unwrap();
        assert_eq!(backend.get("a").await.unwrap(), Some(json!({"id": 1})));

        assert!(backend.delete("a").await.unwrap());
        assert!(!backend.delete("a").await.unwrap());
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_null_value_is_present() {
        let backend = MemoryBackend::new();
        backend.set("a", Value::Null, TTL).await.unwrap();
        assert_eq!(backend.get("a").await.unwrap(), Some(Value::Null));
    }

    #[tokio::test]
    async fn test_search_by_prefix() {
        let backend = MemoryBackend::new();
        for key in ["GET-a+b-QP", "GET-a+b+c-QP", "GET-a+c-QP", "PUT-a+b-QP", "GET-a"] {
            backend.set(key, json!(1), TTL).await.unwrap();
        }

        let mut keys: Vec<String> = backend
            .search("GET-a+b")
            .await
            .unwrap()
            .into_iter()
            .map(|hit| hit.key)
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["GET-a+b+c-QP", "GET-a+b-QP"]);

        assert!(backend.search("DELETE-").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_reports_expiry() {
        let backend = MemoryBackend::new();
        backend.set("GET-a", json!(1), TTL).await.unwrap();
        backend.set("GET-b", json!(1), Duration::ZERO).await.unwrap();

        let hits = backend.search("GET-").await.unwrap();
        assert!(hits[0].expires_at.is_some());
        assert_eq!(hits[1].expires_at, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let backend = MemoryBackend::new();
        backend.set("GET-a", json!(1), Duration::from_secs(5)).await.unwrap();
        backend.set("GET-b", json!(2), Duration::ZERO).await.unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(backend.contains("GET-a"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!backend.contains("GET-a"));
        assert_eq!(backend.search("GET-").await.unwrap().len(), 1);
        assert_eq!(backend.get("GET-a").await.unwrap(), None);
        assert_eq!(backend.len(), 1);

        // zero TTL never expires
        assert_eq!(backend.get("GET-b").await.unwrap(), Some(json!(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let backend = MemoryBackend::new();
        backend.set("a", json!(1), Duration::from_secs(1)).await.unwrap();
        backend.set("b", json!(1), Duration::from_secs(1)).await.unwrap();
        backend.set("c", json!(1), TTL).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(backend.purge_expired(), 2);
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let backend = MemoryBackend::new();
        backend.set("a", json!(1), TTL).await.unwrap();
        backend.set("a", json!(2), TTL).await.unwrap();
        assert_eq!(backend.get("a").await.unwrap(), Some(json!(2)));
        assert_eq!(backend.len(), 1);
    }
}
