//! Connection state machine and reconnect policy for the cache client.
//!
//! States and transitions:
//! - `Disconnected` or `Degraded` → `Connecting` when a connect starts;
//! - `Connecting` → `Ready` on success, `Degraded` when the policy gives up;
//! - `Ready` → `Degraded` (store retained) on connection loss;
//! - retained `Degraded` → `Ready` when a health ping succeeds;
//! - any state → `Disconnected` on shutdown.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::domain::ports::CacheStore;

/// Bounds applied while establishing the store connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Attempts made before giving up.
    pub max_attempts: u32,
    /// Total time budget across all attempts.
    pub retry_window: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(3),
            max_attempts: 10,
            retry_window: Duration::from_secs(60 * 60),
        }
    }
}

impl ReconnectPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use backend::domain::ReconnectPolicy;
    ///
    /// let policy = ReconnectPolicy::default();
    /// assert_eq!(policy.delay_for(1), Duration::from_millis(100));
    /// assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    /// assert_eq!(policy.delay_for(30), Duration::from_secs(3));
    /// ```
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = 2_u64.saturating_pow(attempt.saturating_sub(1));
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(exponent).min(max_ms))
    }
}

/// Externally visible connection phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePhase {
    /// No connection has been attempted, or the client was shut down.
    Disconnected,
    /// A connect is in progress.
    Connecting,
    /// Operations reach the store.
    Ready,
    /// Operations are no-ops until the store recovers.
    Degraded,
}

#[derive(Clone)]
pub(super) enum ConnectionState {
    Disconnected,
    Connecting,
    Ready(Arc<dyn CacheStore>),
    Degraded {
        store: Option<Arc<dyn CacheStore>>,
        reason: String,
    },
}

impl ConnectionState {
    pub(super) fn phase(&self) -> CachePhase {
        match self {
            Self::Disconnected => CachePhase::Disconnected,
            Self::Connecting => CachePhase::Connecting,
            Self::Ready(_) => CachePhase::Ready,
            Self::Degraded { .. } => CachePhase::Degraded,
        }
    }

    /// Store handle usable for operations. Only `Ready` hands one out.
    pub(super) fn ready_store(&self) -> Option<Arc<dyn CacheStore>> {
        match self {
            Self::Ready(store) => Some(Arc::clone(store)),
            _ => None,
        }
    }

    /// `Ready(store)` → retained `Degraded` when `store` is still current.
    pub(super) fn lose(&mut self, store: &Arc<dyn CacheStore>, reason: String) -> bool {
        match self {
            Self::Ready(current) if Arc::ptr_eq(current, store) => {
                *self = Self::Degraded {
                    store: Some(Arc::clone(store)),
                    reason,
                };
                true
            }
            _ => false,
        }
    }

    /// Retained `Degraded(store)` → `Ready` when `store` is still current.
    pub(super) fn recover(&mut self, store: &Arc<dyn CacheStore>) -> bool {
        match self {
            Self::Degraded {
                store: Some(current),
                ..
            } if Arc::ptr_eq(current, store) => {
                *self = Self::Ready(Arc::clone(store));
                true
            }
            _ => false,
        }
    }
}
