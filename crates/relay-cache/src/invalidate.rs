//! Ancestor-prefix invalidation for mutating calls.
//!
//! A write to `/a/b/c` can change what a read of `/a/b/c`, `/a/b` or `/a`
//! returns, so before the write goes out every cached read at the path and
//! its ancestors is deleted. The walk stops once no more than `floor`
//! segments would remain: with the default floor of 1, a write to
//! `/V1/products/123` purges `/V1/products` listings but leaves `/V1` alone.

use std::future::Future;
use std::sync::Arc;

use relay_data::TransportError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::CacheBackend;
use crate::key::{CacheKey, KEY_SEPARATOR};
use crate::path::{ResourcePath, KEY_PATH_SEPARATOR};
use crate::stats::CacheStats;

/// Default number of leading segments the ancestor walk never descends to.
///
/// Ancestors down to two segments are searched; single-segment roots are not.
pub const DEFAULT_INVALIDATION_FLOOR: usize = 1;

/// What to do when the backend fails to search or delete during
/// invalidation. The write proceeds either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteFailurePolicy {
    /// Record in the report and log at debug level.
    Ignore,
    /// Record in the report and log a warning.
    #[default]
    Warn,
}

/// Which backend operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailedOperation {
    Search,
    Delete,
}

/// A backend failure met during invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidationFailure {
    /// The operation that failed.
    pub operation: FailedOperation,
    /// Search pattern or key the operation targeted.
    pub target: String,
    /// Backend error message.
    pub error: String,
}

/// Outcome of one invalidation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvalidationReport {
    /// Search patterns issued, most specific first.
    pub patterns: Vec<String>,
    /// Keys actually deleted.
    pub deleted: Vec<String>,
    /// Backend failures, in the order they happened.
    pub failures: Vec<InvalidationFailure>,
}

impl InvalidationReport {
    /// Whether every search and delete succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Deletes cached reads at a path and its ancestors.
pub struct Invalidator {
    backend: Arc<dyn CacheBackend>,
    stats: Arc<CacheStats>,
    floor: usize,
    delete_failures: DeleteFailurePolicy,
    segment_boundary: bool,
}

impl Invalidator {
    /// Create an invalidator with the default floor and failure policy.
    pub fn new(backend: Arc<dyn CacheBackend>, stats: Arc<CacheStats>) -> Self {
        Self {
            backend,
            stats,
            floor: DEFAULT_INVALIDATION_FLOOR,
            delete_failures: DeleteFailurePolicy::default(),
            segment_boundary: true,
        }
    }

    /// Set the ancestor walk floor.
    pub fn with_floor(mut self, floor: usize) -> Self {
        self.floor = floor;
        self
    }

    /// Set how backend failures are surfaced.
    pub fn with_delete_failures(mut self, policy: DeleteFailurePolicy) -> Self {
        self.delete_failures = policy;
        self
    }

    /// Only delete matches whose path ends at a segment boundary.
    ///
    /// When enabled (the default) a write to `/a/b` purges `/a/b` and
    /// `/a/b/c` but not `/a/bc`. When disabled every raw prefix match is
    /// deleted.
    pub fn with_segment_boundary(mut self, enabled: bool) -> Self {
        self.segment_boundary = enabled;
        self
    }

    /// The ancestor walk floor.
    pub fn floor(&self) -> usize {
        self.floor
    }

    /// Search patterns for a write at `path`, most specific first.
    ///
    /// The path itself is always searched; each shorter prefix is searched
    /// only while it keeps more than `floor` segments. The root is never
    /// searched.
    pub fn search_patterns(&self, path: &ResourcePath) -> Vec<String> {
        path.ancestors()
            .enumerate()
            .take_while(|(i, prefix)| *i == 0 || prefix.len() > self.floor)
            .map(|(_, prefix)| CacheKey::read_prefix(&prefix))
            .collect()
    }

    /// Delete every cached read under `path` and its ancestors.
    ///
    /// Never fails: backend errors are collected in the report.
    pub async fn invalidate(&self, path: &ResourcePath) -> InvalidationReport {
        let mut report = InvalidationReport::default();

        if path.is_root() {
            debug!(path = %path, "root write, nothing to invalidate");
            return report;
        }

        for pattern in self.search_patterns(path) {
            let hits = match self.backend.search(&pattern).await {
                Ok(hits) => hits,
                Err(e) => {
                    self.stats.record_backend_error();
                    self.record_failure(
                        &mut report,
                        FailedOperation::Search,
                        &pattern,
                        e.to_string(),
                    );
                    report.patterns.push(pattern);
                    continue;
                }
            };

            for hit in hits {
                if self.segment_boundary && !at_segment_boundary(&hit.key, &pattern) {
                    continue;
                }
                match self.backend.delete(&hit.key).await {
                    Ok(true) => report.deleted.push(hit.key),
                    // Already expired or removed by someone else.
                    Ok(false) => {}
                    Err(e) => {
                        self.stats.record_delete_failure();
                        self.record_failure(
                            &mut report,
                            FailedOperation::Delete,
                            &hit.key,
                            e.to_string(),
                        );
                    }
                }
            }
            report.patterns.push(pattern);
        }

        self.stats.record_invalidated(report.deleted.len() as u64);
        debug!(
            path = %path,
            patterns = report.patterns.len(),
            deleted = report.deleted.len(),
            failures = report.failures.len(),
            "invalidated cached reads"
        );
        report
    }

    /// Invalidate for a write at `path`, then perform the write.
    ///
    /// `transport_call` runs exactly once whatever the invalidation outcome,
    /// and its error is returned unchanged.
    pub async fn write_through<F, Fut>(
        &self,
        path: &ResourcePath,
        transport_call: F,
    ) -> Result<Value, TransportError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, TransportError>>,
    {
        self.invalidate(path).await;
        transport_call().await
    }

    fn record_failure(
        &self,
        report: &mut InvalidationReport,
        operation: FailedOperation,
        target: &str,
        error: String,
    ) {
        match self.delete_failures {
            DeleteFailurePolicy::Warn => {
                warn!(
                    ?operation,
                    subject = target,
                    error = %error,
                    "cache invalidation step failed"
                )
            }
            DeleteFailurePolicy::Ignore => {
                debug!(
                    ?operation,
                    subject = target,
                    error = %error,
                    "cache invalidation step failed"
                )
            }
        }
        report.failures.push(InvalidationFailure {
            operation,
            target: target.to_string(),
            error,
        });
    }
}

fn at_segment_boundary(key: &str, pattern: &str) -> bool {
    match key.strip_prefix(pattern) {
        Some(rest) => {
            rest.is_empty()
                || rest.starts_with(KEY_SEPARATOR)
                || rest.starts_with(KEY_PATH_SEPARATOR)
        }
        None => false,
    }
}
