//! Registry error types.

use relay_cache::ProxyError;
use thiserror::Error;

/// Errors from [`ServiceRegistry`](crate::ServiceRegistry).
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Service or operation name is empty.
    #[error("service and operation must both be specified")]
    EmptyName,

    /// No service registered under this name.
    #[error("unknown service: {0}")]
    UnknownService(String),

    /// The service has no such operation.
    #[error("unknown operation {operation} on service {service}")]
    UnknownOperation { service: String, operation: String },

    /// A `{param}` in the path template was not supplied.
    #[error("missing path parameter {param} for {path_template}")]
    MissingPathParam { path_template: String, param: String },

    /// A `{` in the path template is never closed.
    #[error("unterminated placeholder in path template {0}")]
    BadTemplate(String),

    /// The proxied call failed.
    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

impl RegistryError {
    /// Whether this error came from the call itself rather than from
    /// resolving the service and operation.
    pub fn is_call_error(&self) -> bool {
        matches!(self, Self::Proxy(_))
    }
}
