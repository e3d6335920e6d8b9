//! Named services dispatching onto the caching proxy.

use std::collections::HashMap;
use std::time::Duration;

use relay_cache::CachingClient;
use relay_data::Transport;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::RegistryError;
use crate::operation::{Operation, OperationArgs};

/// A named group of operations, e.g. `catalogProductRepositoryV1`.
#[derive(Debug, Clone, Default)]
pub struct ServiceDefinition {
    name: String,
    operations: HashMap<String, Operation>,
}

impl ServiceDefinition {
    /// Create an empty service.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: HashMap::new(),
        }
    }

    /// Add an operation.
    pub fn operation(mut self, name: impl Into<String>, operation: Operation) -> Self {
        self.operations.insert(name.into(), operation);
        self
    }

    /// The service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up an operation.
    pub fn get(&self, operation: &str) -> Option<&Operation> {
        self.operations.get(operation)
    }

    /// Names of every operation, sorted.
    pub fn operation_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Resolves `(service, operation)` pairs into proxied API calls.
///
/// Resolution errors (unknown names, missing path parameters) are always
/// returned. Errors from the call itself can be suppressed, registry-wide
/// or per call, in which case the call yields `Ok(None)`.
pub struct ServiceRegistry<T> {
    client: CachingClient<T>,
    services: HashMap<String, ServiceDefinition>,
    suppress_errors: bool,
}

impl<T: Transport> ServiceRegistry<T> {
    /// Create a registry over `client`.
    pub fn new(client: CachingClient<T>) -> Self {
        Self {
            client,
            services: HashMap::new(),
            suppress_errors: false,
        }
    }

    /// Register a service, replacing any with the same name.
    pub fn register(&mut self, service: ServiceDefinition) -> &mut Self {
        self.services.insert(service.name.clone(), service);
        self
    }

    /// Suppress call errors for every call.
    pub fn suppress_errors(&mut self, suppress: bool) -> &mut Self {
        self.suppress_errors = suppress;
        self
    }

    /// Look up a service.
    pub fn service(&self, name: &str) -> Option<&ServiceDefinition> {
        self.services.get(name)
    }

    /// The underlying caching client.
    pub fn client(&self) -> &CachingClient<T> {
        &self.client
    }

    /// Use `ttl` for the next cached read only.
    pub fn set_temporary_ttl(&self, ttl: Duration) {
        self.client.set_temporary_ttl(ttl);
    }

    /// Call `operation` on `service`.
    pub async fn call(
        &self,
        service: &str,
        operation: &str,
        args: OperationArgs,
    ) -> Result<Option<Value>, RegistryError> {
        self.dispatch(service, operation, args, self.suppress_errors)
            .await
    }

    /// Call `operation` on `service`, suppressing a failure of the call.
    pub async fn call_suppressed(
        &self,
        service: &str,
        operation: &str,
        args: OperationArgs,
    ) -> Result<Option<Value>, RegistryError> {
        self.dispatch(service, operation, args, true).await
    }

    async fn dispatch(
        &self,
        service: &str,
        operation: &str,
        args: OperationArgs,
        suppress: bool,
    ) -> Result<Option<Value>, RegistryError> {
        if service.is_empty() || operation.is_empty() {
            return Err(RegistryError::EmptyName);
        }

        let definition = self
            .services
            .get(service)
            .ok_or_else(|| RegistryError::UnknownService(service.to_string()))?;
        let op = definition
            .get(operation)
            .ok_or_else(|| RegistryError::UnknownOperation {
                service: service.to_string(),
                operation: operation.to_string(),
            })?;
        let request = op.request(args)?;

        debug!(
            service,
            operation,
            method = %request.method,
            path = %request.resource_path,
            "dispatching"
        );

        match self.client.call_api_with_ttl(request, op.cache_ttl).await {
            Ok((value, _)) => Ok(Some(value)),
            Err(e) if suppress => {
                warn!(service, operation, error = %e, "suppressed API call failure");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
