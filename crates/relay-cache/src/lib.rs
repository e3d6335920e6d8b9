//! Read-through caching and hierarchical invalidation for resource-oriented
//! API clients.
//!
//! This crate provides:
//! - `CachingClient` - Wraps a [`Transport`](relay_data::Transport) and caches `GET` calls
//! - `CacheKeyBuilder` - Deterministic keys from method, path and parameters
//! - `TtlPolicy` - Default TTL with a one-shot override
//! - `ReadThroughGate` - Cache lookup with transport fallback
//! - `Invalidator` - Ancestor-prefix invalidation before writes
//! - `CacheBackend` - Pluggable storage, with `MemoryBackend` as the default
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use relay_cache::CachingClient;
//! use relay_data::ApiRequest;
//!
//! let client = CachingClient::with_memory_backend(magento);
//!
//! // First call goes to the API, the second is served from cache.
//! let product = client.call_api(ApiRequest::get("/V1/products/123")).await?;
//! let product = client.call_api(ApiRequest::get("/V1/products/123")).await?;
//!
//! // Cache the next read for one minute only.
//! client.set_temporary_ttl(Duration::from_secs(60));
//! let stock = client.call_api(ApiRequest::get("/V1/stockItems/123")).await?;
//!
//! // Drops the cached product before the update is sent.
//! client
//!     .call_api(ApiRequest::put("/V1/products/123").body(json!({"product": {"name": "x"}})))
//!     .await?;
//! ```

mod backend;
mod client;
mod config;
mod error;
mod gate;
mod invalidate;
mod key;
mod lock;
mod memory;
pub mod path;
mod stats;
mod ttl;

pub use backend::*;
pub use client::*;
pub use config::*;
pub use error::*;
pub use gate::*;
pub use invalidate::*;
pub use key::*;
pub use memory::*;
pub use path::ResourcePath;
pub use stats::*;
pub use ttl::*;
