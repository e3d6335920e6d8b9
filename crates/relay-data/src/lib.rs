//! Transport contract for the relay caching API proxy.
//!
//! The proxy never talks to the network itself. It hands every call to a
//! [`Transport`], which is whatever generated API client the application
//! already uses, and only decides whether the call can be answered from
//! cache first.
//!
//! # Example
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use relay_data::{ApiRequest, Transport, TransportError};
//! use serde_json::Value;
//!
//! struct MagentoClient { /* ... */ }
//!
//! #[async_trait]
//! impl Transport for MagentoClient {
//!     async fn invoke(&self, request: &ApiRequest) -> Result<Value, TransportError> {
//!         // perform the HTTP call and deserialize the body
//!         # unimplemented!()
//!     }
//! }
//!
//! let request = ApiRequest::get("/V1/products/123").response_type("Product");
//! ```

mod error;
mod request;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

pub use error::TransportError;
pub use request::{ApiRequest, Method, Params};

/// The API client the proxy delegates to.
///
/// Implementations perform the actual request and deserialize the response.
/// Errors are returned to the proxy's caller untouched.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform `request` against the remote API.
    async fn invoke(&self, request: &ApiRequest) -> Result<Value, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn invoke(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        (**self).invoke(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn invoke(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        (**self).invoke(request).await
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{ApiRequest, Method, Params, Transport, TransportError};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl Transport for Echo {
        async fn invoke(&self, request: &ApiRequest) -> Result<Value, TransportError> {
            Ok(json!({ "path": request.resource_path, "method": request.method.as_str() }))
        }
    }

    #[tokio::test]
    async fn test_arc_transport_delegates() {
        let transport: Arc<dyn Transport> = Arc::new(Echo);
        let result = transport
            .invoke(&ApiRequest::get("/V1/products/1"))
            .await
            .unwrap();
        assert_eq!(result["path"], "/V1/products/1");
        assert_eq!(result["method"], "GET");
    }

    #[test]
    fn test_error_status() {
        let err = TransportError::HttpError {
            status: 404,
            message: "No such entity".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "HTTP 404: No such entity");
        assert_eq!(TransportError::Timeout.status(), None);
    }
}
