//! Typed service/operation dispatch over the relay caching proxy.
//!
//! Generated API clients group endpoints into services with one method per
//! operation. Instead of resolving those by name at runtime, services are
//! declared as tables of [`Operation`]s and every call goes through the
//! [`CachingClient`](relay_cache::CachingClient), so reads are cached and
//! writes invalidate.
//!
//! # Example
//!
//! ```rust,ignore
//! use relay_registry::{Operation, OperationArgs, ServiceDefinition, ServiceRegistry};
//!
//! let mut registry = ServiceRegistry::new(CachingClient::with_memory_backend(magento));
//! registry.register(
//!     ServiceDefinition::new("catalogProductRepositoryV1")
//!         .operation("get", Operation::get("/V1/products/{sku}"))
//!         .operation("save", Operation::put("/V1/products/{sku}")),
//! );
//!
//! let product = registry
//!     .call("catalogProductRepositoryV1", "get", OperationArgs::new().path("sku", "MH01"))
//!     .await?;
//! ```

mod error;
mod operation;
mod registry;

pub use error::RegistryError;
pub use operation::{Operation, OperationArgs};
pub use registry::{ServiceDefinition, ServiceRegistry};
