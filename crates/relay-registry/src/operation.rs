//! Operation definitions and their arguments.

use std::collections::BTreeMap;
use std::time::Duration;

use relay_data::{ApiRequest, Method, Params};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RegistryError;

/// One endpoint of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// HTTP method.
    pub method: Method,
    /// Path template, e.g. `/V1/products/{sku}`.
    pub path_template: String,
    /// Response type hint passed to the transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,
    /// TTL for reads of this operation, instead of the proxy default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<Duration>,
}

impl Operation {
    /// Create an operation.
    pub fn new(method: Method, path_template: impl Into<String>) -> Self {
        Self {
            method,
            path_template: path_template.into(),
            response_type: None,
            cache_ttl: None,
        }
    }

    /// Shorthand for a `GET` operation.
    pub fn get(path_template: impl Into<String>) -> Self {
        Self::new(Method::Get, path_template)
    }

    /// Shorthand for a `POST` operation.
    pub fn post(path_template: impl Into<String>) -> Self {
        Self::new(Method::Post, path_template)
    }

    /// Shorthand for a `PUT` operation.
    pub fn put(path_template: impl Into<String>) -> Self {
        Self::new(Method::Put, path_template)
    }

    /// Shorthand for a `DELETE` operation.
    pub fn delete(path_template: impl Into<String>) -> Self {
        Self::new(Method::Delete, path_template)
    }

    /// Set the response type hint.
    pub fn with_response_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_type = Some(response_type.into());
        self
    }

    /// Cache reads of this operation for `ttl`.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Fill the path template from `path_params`.
    ///
    /// Values are percent-encoded so a parameter can never add path segments.
    pub fn render_path(
        &self,
        path_params: &BTreeMap<String, String>,
    ) -> Result<String, RegistryError> {
        let template = &self.path_template;
        let mut out = String::with_capacity(template.len());
        let mut rest = template.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| RegistryError::BadTemplate(template.clone()))?;
            let name = &after[..close];
            let value = path_params
                .get(name)
                .ok_or_else(|| RegistryError::MissingPathParam {
                    path_template: template.clone(),
                    param: name.to_string(),
                })?;
            out.push_str(&encode_path_param(value));
            rest = &after[close + 1..];
        }
        out.push_str(rest);

        Ok(out)
    }

    /// Build the request for this operation.
    pub fn request(&self, args: OperationArgs) -> Result<ApiRequest, RegistryError> {
        let mut request = ApiRequest::new(self.method, self.render_path(&args.path_params)?)
            .with_query_params(args.query_params)
            .with_header_params(args.header_params)
            .body(args.post_data);
        request.response_type = self.response_type.clone();
        Ok(request)
    }
}

/// Arguments for one operation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationArgs {
    /// Values for `{param}` placeholders in the path template.
    pub path_params: BTreeMap<String, String>,
    /// Query string parameters.
    pub query_params: Params,
    /// Request body.
    pub post_data: Value,
    /// Extra request headers.
    pub header_params: Params,
}

impl OperationArgs {
    /// Empty arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a path template parameter.
    pub fn path(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header_params.insert(name.into(), value.into());
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: Value) -> Self {
        self.post_data = body;
        self
    }
}

// RFC 3986 unreserved characters pass through, everything else is escaped.
fn encode_path_param(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
