//! Cache key composition.
//!
//! A key has the shape
//! `METHOD-path+segments-QP[:digest]-PD[:digest]-HP[:digest]-RT[:type]`.
//! Parameter maps are reduced to a digest of their canonical JSON form, so
//! the same logical parameters always produce the same key regardless of the
//! order they were inserted in.

use std::fmt;

use relay_data::{ApiRequest, Method, Params};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::PathError;
use crate::path::ResourcePath;

/// Separator between key components.
pub const KEY_SEPARATOR: char = '-';

const QUERY_LABEL: &str = "QP";
const POST_DATA_LABEL: &str = "PD";
const HEADER_LABEL: &str = "HP";
const RESPONSE_TYPE_LABEL: &str = "RT";

/// Digest length in bytes (hex-encoded to twice as many characters).
const DIGEST_BYTES: usize = 16;

/// A cache key uniquely identifying a cached response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// The computed key string.
    key: String,
    /// Components that make up the key (for debugging).
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    components: Vec<String>,
}

impl CacheKey {
    /// Create a cache key from a string.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            components: Vec::new(),
        }
    }

    /// Build the key for a request.
    pub fn for_request(request: &ApiRequest) -> Result<Self, PathError> {
        let path = ResourcePath::parse(&request.resource_path)?;
        Ok(CacheKeyBuilder::from_request(request, &path).build())
    }

    /// Search pattern matching every cached read at `path` or below it.
    pub fn read_prefix(path: &ResourcePath) -> String {
        format!("{}{}{}", Method::Get.as_str(), KEY_SEPARATOR, path.to_key_segment())
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Get the key components (for debugging).
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Consume the key, returning the key string.
    pub fn into_string(self) -> String {
        self.key
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.key
    }
}

/// Builder for composing cache keys.
#[derive(Debug, Clone)]
pub struct CacheKeyBuilder<'a> {
    method: Method,
    path: &'a ResourcePath,
    query_params: Option<&'a Params>,
    post_data: Option<&'a Value>,
    header_params: Option<&'a Params>,
    response_type: Option<&'a str>,
}

impl<'a> CacheKeyBuilder<'a> {
    /// Start a key for `method` on `path`.
    pub fn new(method: Method, path: &'a ResourcePath) -> Self {
        Self {
            method,
            path,
            query_params: None,
            post_data: None,
            header_params: None,
            response_type: None,
        }
    }

    /// Start a key from every component of `request`.
    pub fn from_request(request: &'a ApiRequest, path: &'a ResourcePath) -> Self {
        let mut builder = Self::new(request.method, path)
            .query_params(&request.query_params)
            .post_data(&request.post_data)
            .header_params(&request.header_params);
        if let Some(rt) = request.response_type.as_deref() {
            builder = builder.response_type(rt);
        }
        builder
    }

    /// Include query parameters.
    pub fn query_params(mut self, params: &'a Params) -> Self {
        self.query_params = Some(params);
        self
    }

    /// Include the request body.
    pub fn post_data(mut self, body: &'a Value) -> Self {
        self.post_data = Some(body);
        self
    }

    /// Include header parameters.
    pub fn header_params(mut self, params: &'a Params) -> Self {
        self.header_params = Some(params);
        self
    }

    /// Include the response type hint.
    pub fn response_type(mut self, response_type: &'a str) -> Self {
        self.response_type = Some(response_type);
        self
    }

    /// Build the cache key.
    pub fn build(&self) -> CacheKey {
        let path = self.path.to_key_segment();
        let query = labeled(QUERY_LABEL, self.query_params.and_then(params_digest));
        let post = labeled(POST_DATA_LABEL, self.post_data.and_then(value_digest));
        let headers = labeled(HEADER_LABEL, self.header_params.and_then(params_digest));
        let response_type = labeled(
            RESPONSE_TYPE_LABEL,
            self.response_type
                .filter(|rt| !rt.is_empty())
                .map(str::to_string),
        );

        let parts = [
            self.method.as_str().to_string(),
            path,
            query,
            post,
            headers,
            response_type,
        ];

        let mut key = String::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                key.push(KEY_SEPARATOR);
            }
            key.push_str(part);
        }

        CacheKey {
            key,
            components: vec![
                format!("method:{}", self.method),
                format!("path:{}", self.path),
                format!("query:{}", parts[2]),
                format!("post:{}", parts[3]),
                format!("headers:{}", parts[4]),
                format!("response_type:{}", parts[5]),
            ],
        }
    }
}

fn labeled(label: &str, value: Option<String>) -> String {
    match value {
        Some(value) => format!("{}:{}", label, value),
        None => label.to_string(),
    }
}

fn params_digest(params: &Params) -> Option<String> {
    if params.is_empty() {
        return None;
    }
    let map: serde_json::Map<String, Value> = params
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    value_digest(&Value::Object(map))
}

fn value_digest(value: &Value) -> Option<String> {
    if is_empty_value(value) {
        return None;
    }
    let mut canonical = String::new();
    write_canonical(value, &mut canonical);

    let digest = Sha256::digest(canonical.as_bytes());
    Some(hex::encode(&digest[..DIGEST_BYTES]))
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

// Object keys are sorted at every level so the output does not depend on
// serde_json's map ordering.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (k, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(k.clone()).to_string());
                out.push(':');
                write_canonical(v, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(request: &ApiRequest) -> String {
        CacheKey::for_request(request).unwrap().into_string()
    }

    #[test]
    fn test_bare_get_key() {
        let req = ApiRequest::get("/products/123");
        assert_eq!(key(&req), "GET-products+123-QP-PD-HP-RT");
    }

    #[test]
    fn test_labeled_components_carry_digests() {
        let req = ApiRequest::get("/V1/products")
            .query("searchCriteria[pageSize]", "10")
            .header("Store", "default")
            .response_type("ProductSearchResultsInterface");
        let k = key(&req);

        assert!(k.starts_with("GET-V1+products-QP:"));
        assert!(k.contains("-PD-HP:"));
        assert!(k.ends_with("-RT:ProductSearchResultsInterface"));

        let query_digest = k
            .split('-')
            .nth(2)
            .and_then(|part| part.strip_prefix("QP:"))
            .unwrap();
        assert_eq!(query_digest.len(), DIGEST_BYTES * 2);
        assert!(query_digest
            .chars()
            .all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    }

    #[test]
    fn test_key_is_deterministic() {
        let req = ApiRequest::put("/V1/products/sku-1").body(json!({"product": {"name": "x"}}));
        assert_eq!(key(&req), key(&req.clone()));
    }

    #[test]
    fn test_key_ignores_insertion_order() {
        let a = ApiRequest::get("/V1/orders")
            .query("a", "1")
            .query("b", "2")
            .header("X-One", "1")
            .header("X-Two", "2");
        let b = ApiRequest::get("/V1/orders")
            .query("b", "2")
            .query("a", "1")
            .header("X-Two", "2")
            .header("X-One", "1");
        assert_eq!(key(&a), key(&b));

        let mut first = serde_json::Map::new();
        first.insert("name".into(), json!("x"));
        first.insert("price".into(), json!(10));
        let mut second = serde_json::Map::new();
        second.insert("price".into(), json!(10));
        second.insert("name".into(), json!("x"));
        let a = ApiRequest::post("/V1/products").body(Value::Object(first));
        let b = ApiRequest::post("/V1/products").body(Value::Object(second));
        assert_eq!(key(&a), key(&b));
    }

    #[test]
    fn test_key_is_sensitive_to_each_component() {
        let base = ApiRequest::get("/V1/products/1")
            .query("fields", "sku")
            .body(json!({"filter": 1}))
            .header("Store", "default")
            .response_type("Product");
        let base_key = key(&base);

        let mut method = base.clone();
        method.method = Method::Post;
        let path = ApiRequest {
            resource_path: "/V1/products/2".into(),
            ..base.clone()
        };
        let query = base.clone().query("fields", "name");
        let body = base.clone().body(json!({"filter": 2}));
        let headers = base.clone().header("Store", "fr");
        let response_type = base.clone().response_type("ProductInterface");

        for changed in [method, path, query, body, headers, response_type] {
            assert_ne!(key(&changed), base_key, "{:?}", changed);
        }
    }

    #[test]
    fn test_empty_maps_and_bodies_are_unlabeled() {
        for body in [Value::Null, json!({}), json!([]), json!("")] {
            let req = ApiRequest::post("/V1/carts").body(body);
            assert_eq!(key(&req), "POST-V1+carts-QP-PD-HP-RT");
        }

        let req = ApiRequest::get("/V1/carts").response_type("");
        assert_eq!(key(&req), "GET-V1+carts-QP-PD-HP-RT");
    }

    #[test]
    fn test_falsy_body_still_digested() {
        let req = ApiRequest::post("/V1/flags").body(json!(false));
        assert!(key(&req).contains("-PD:"));
    }

    #[test]
    fn test_same_content_in_different_slots_differs() {
        let query = ApiRequest::get("/V1/x").query("a", "1");
        let header = ApiRequest::get("/V1/x").header("a", "1");
        assert_ne!(key(&query), key(&header));
    }

    #[test]
    fn test_read_prefix_matches_own_key() {
        let path = ResourcePath::parse("/products/123").unwrap();
        let prefix = CacheKey::read_prefix(&path);
        assert_eq!(prefix, "GET-products+123");
        assert!(key(&ApiRequest::get("/products/123")).starts_with(&prefix));
    }

    #[test]
    fn test_invalid_path_is_rejected() {
        let req = ApiRequest::get("/V1/products?sku=1");
        assert!(CacheKey::for_request(&req).is_err());
    }

    #[test]
    fn test_components_describe_key() {
        let k = CacheKey::for_request(&ApiRequest::get("/a/b")).unwrap();
        assert_eq!(k.components()[0], "method:GET");
        assert_eq!(k.components()[1], "path:/a/b");
    }
}
