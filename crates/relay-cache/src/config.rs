//! Proxy configuration.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::invalidate::{DeleteFailurePolicy, DEFAULT_INVALIDATION_FLOOR};
use crate::ttl::DEFAULT_TTL;

/// Configuration for a [`CachingClient`](crate::CachingClient).
///
/// ```toml
/// default_ttl_secs = 600
/// invalidation_floor = 1
/// delete_failures = "warn"
/// match_segment_boundary = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// TTL for cached reads when no override is pending.
    pub default_ttl_secs: u64,

    /// Ancestor prefixes with this many segments or fewer are never searched
    /// during invalidation (the written path itself always is). The default
    /// of 1 reaches two-segment listings such as `/V1/products`.
    pub invalidation_floor: usize,

    /// How backend failures during invalidation are surfaced.
    pub delete_failures: DeleteFailurePolicy,

    /// Only invalidate keys whose path ends at a segment boundary.
    pub match_segment_boundary: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: DEFAULT_TTL.as_secs(),
            invalidation_floor: DEFAULT_INVALIDATION_FLOOR,
            delete_failures: DeleteFailurePolicy::default(),
            match_segment_boundary: true,
        }
    }
}

impl ProxyConfig {
    /// Load config from a TOML or JSON file (chosen by extension).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            Self::from_toml_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Parse config from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Default TTL as a duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    /// Set the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl_secs = ttl.as_secs();
        self
    }

    /// Set the invalidation floor.
    pub fn with_invalidation_floor(mut self, floor: usize) -> Self {
        self.invalidation_floor = floor;
        self
    }

    /// Set the delete failure policy.
    pub fn with_delete_failures(mut self, policy: DeleteFailurePolicy) -> Self {
        self.delete_failures = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProxyConfig::default();
        assert_eq!(config.default_ttl(), Duration::from_secs(600));
        assert_eq!(config.invalidation_floor, 1);
        assert_eq!(config.delete_failures, DeleteFailurePolicy::Warn);
        assert!(config.match_segment_boundary);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ProxyConfig::from_toml_str(
            r#"
            default_ttl_secs = 30
            delete_failures = "ignore"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_ttl(), Duration::from_secs(30));
        assert_eq!(config.delete_failures, DeleteFailurePolicy::Ignore);
        assert_eq!(config.invalidation_floor, 1);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(ProxyConfig::from_toml_str("delete_failures = \"loud\"").is_err());
    }

    #[test]
    fn test_load_json_and_toml_files() {
        let dir = std::env::temp_dir().join(format!("relay-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let json_path = dir.join("proxy.json");
        std::fs::write(&json_path, r#"{"invalidation_floor": 3}"#).unwrap();
        assert_eq!(ProxyConfig::load(&json_path).unwrap().invalidation_floor, 3);

        let toml_path = dir.join("proxy.toml");
        std::fs::write(&toml_path, "match_segment_boundary = false\n").unwrap();
        assert!(!ProxyConfig::load(&toml_path).unwrap().match_segment_boundary);

        let missing = ProxyConfig::load(dir.join("missing.toml")).unwrap_err();
        assert!(missing.to_string().contains("Failed to read config file"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_builder_setters() {
        let config = ProxyConfig::default()
            .with_default_ttl(Duration::from_secs(5))
            .with_invalidation_floor(0)
            .with_delete_failures(DeleteFailurePolicy::Ignore);
        assert_eq!(config.default_ttl_secs, 5);
        assert_eq!(config.invalidation_floor, 0);
    }
}
