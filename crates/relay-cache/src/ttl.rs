//! Time-to-live selection for cache writes.

use std::sync::Mutex;
use std::time::Duration;

use crate::lock::mutex_lock;

const SOURCE: &str = "cache::ttl";

/// Default time-to-live for cached reads.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Override state for the next cache write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtlState {
    /// Use the policy's default TTL.
    #[default]
    Default,
    /// Use this TTL for the next cache write, then revert to `Default`.
    OverridePending(Duration),
}

/// Default TTL plus a one-shot override.
///
/// The override applies to exactly one cache write. Setting it again before
/// that write replaces the pending value.
#[derive(Debug)]
pub struct TtlPolicy {
    default_ttl: Duration,
    state: Mutex<TtlState>,
}

impl TtlPolicy {
    /// Create a policy with the given default TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            state: Mutex::new(TtlState::Default),
        }
    }

    /// The TTL used when no override is pending.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Use `ttl` for the next cache write only.
    pub fn set_override(&self, ttl: Duration) {
        *mutex_lock(&self.state, SOURCE, "set_override") = TtlState::OverridePending(ttl);
    }

    /// The currently pending override, if any.
    pub fn pending(&self) -> Option<Duration> {
        match *mutex_lock(&self.state, SOURCE, "pending") {
            TtlState::OverridePending(ttl) => Some(ttl),
            TtlState::Default => None,
        }
    }

    /// Take the TTL for a cache write.
    ///
    /// Returns the pending override and `true` if there was one, otherwise the
    /// default and `false`. The state is `Default` afterwards either way.
    pub fn ttl_for_next_write(&self) -> (Duration, bool) {
        let mut state = mutex_lock(&self.state, SOURCE, "ttl_for_next_write");
        let previous = std::mem::take(&mut *state);
        drop(state);
        match previous {
            TtlState::OverridePending(ttl) => (ttl, true),
            TtlState::Default => (self.default_ttl, false),
        }
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
