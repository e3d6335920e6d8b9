//! API request description.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::TransportError;

/// Query or header parameters.
///
/// Ordered so that two maps holding the same pairs serialize identically no
/// matter which order they were filled in.
pub type Params = BTreeMap<String, String>;

/// HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    /// Convert to HTTP method string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }

    /// Whether responses to this method may be served from cache.
    ///
    /// Only `GET` is a read; every other verb is treated as a mutation.
    pub fn is_read(&self) -> bool {
        matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            other => Err(TransportError::RequestError(format!(
                "unsupported method: {}",
                other
            ))),
        }
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = TransportError;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Patch => http::Method::PATCH,
            Method::Delete => http::Method::DELETE,
            Method::Head => http::Method::HEAD,
            Method::Options => http::Method::OPTIONS,
        }
    }
}

/// A single call against the remote API.
///
/// Mirrors the arguments a generated API client passes to its transport:
/// resource path, method, query parameters, request body, header parameters
/// and the expected response type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// Resource path relative to the API base URL (e.g. `/V1/products/123`).
    pub resource_path: String,
    /// HTTP method.
    pub method: Method,
    /// Query string parameters.
    #[serde(default)]
    pub query_params: Params,
    /// Request body.
    #[serde(default)]
    pub post_data: Value,
    /// Request header parameters.
    #[serde(default)]
    pub header_params: Params,
    /// Response type hint used by the client to deserialize the body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,
}

impl ApiRequest {
    /// Create a new request with no parameters.
    pub fn new(method: Method, resource_path: impl Into<String>) -> Self {
        Self {
            resource_path: resource_path.into(),
            method,
            query_params: Params::new(),
            post_data: Value::Null,
            header_params: Params::new(),
            response_type: None,
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(resource_path: impl Into<String>) -> Self {
        Self::new(Method::Get, resource_path)
    }

    /// Shorthand for a `POST` request.
    pub fn post(resource_path: impl Into<String>) -> Self {
        Self::new(Method::Post, resource_path)
    }

    /// Shorthand for a `PUT` request.
    pub fn put(resource_path: impl Into<String>) -> Self {
        Self::new(Method::Put, resource_path)
    }

    /// Shorthand for a `DELETE` request.
    pub fn delete(resource_path: impl Into<String>) -> Self {
        Self::new(Method::Delete, resource_path)
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    /// Replace all query parameters.
    pub fn with_query_params(mut self, params: Params) -> Self {
        self.query_params = params;
        self
    }

    /// Add a header parameter.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.header_params.insert(key.into(), value.into());
        self
    }

    /// Replace all header parameters.
    pub fn with_header_params(mut self, params: Params) -> Self {
        self.header_params = params;
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: Value) -> Self {
        self.post_data = body;
        self
    }

    /// Set the request body from any serializable value.
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, TransportError> {
        self.post_data = serde_json::to_value(value)?;
        Ok(self)
    }

    /// Set the response type hint.
    pub fn response_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_type = Some(response_type.into());
        self
    }
}
