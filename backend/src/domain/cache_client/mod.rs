//! Best-effort JSON cache client with an explicit connection state machine.
//!
//! The client is constructed once at startup and shared through `Arc`. Every
//! operation degrades to a no-op unless the client is `Ready`: reads report a
//! miss, writes and deletes report failure, and errors are logged rather than
//! returned. Callers therefore never need to branch on cache availability.
//!
//! The state lives behind a short synchronous lock that is released before any
//! store call. Connect attempts are serialised by a separate async gate, so a
//! long reconnect never stalls ordinary operations.

mod policy;
mod runtime;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub use policy::{CachePhase, ReconnectPolicy};
pub use runtime::{CacheClientRuntime, ReconnectSleeper, TokioSleeper};

use policy::ConnectionState;

use crate::domain::ports::{
    CacheConnector, CacheHealthQuery, CacheKey, CachePattern, CacheStore, CacheStoreError,
};

const HEALTHY_MESSAGE: &str = "Cache store is responding";
const DISCONNECTED_MESSAGE: &str = "Cache store not connected";

/// Coarse cache health classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheHealthStatus {
    /// The store answered a ping.
    Healthy,
    /// The client believes it is connected but the ping failed.
    Unhealthy,
    /// No usable connection.
    Disconnected,
}

/// Health report returned by [`CacheClient::health`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheHealth {
    pub status: CacheHealthStatus,
    pub message: String,
}

impl CacheHealth {
    #[must_use]
    pub fn new(status: CacheHealthStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn healthy() -> Self {
        Self {
            status: CacheHealthStatus::Healthy,
            message: HEALTHY_MESSAGE.to_owned(),
        }
    }

    fn unhealthy(message: String) -> Self {
        Self {
            status: CacheHealthStatus::Unhealthy,
            message,
        }
    }

    fn disconnected() -> Self {
        Self {
            status: CacheHealthStatus::Disconnected,
            message: DISCONNECTED_MESSAGE.to_owned(),
        }
    }
}

/// Process-wide cache client.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use backend::domain::{CacheClient, CachePhase};
/// use backend::domain::ports::{CacheKey, UnavailableCacheConnector};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let client = CacheClient::new(Arc::new(UnavailableCacheConnector));
/// assert!(!client.connect().await);
/// assert_eq!(client.phase(), CachePhase::Degraded);
///
/// let key = CacheKey::new("user_data:u1").expect("key");
/// assert_eq!(client.get::<String>(&key).await, None);
/// # });
/// ```
pub struct CacheClient {
    connector: Arc<dyn CacheConnector>,
    policy: ReconnectPolicy,
    runtime: CacheClientRuntime,
    state: RwLock<ConnectionState>,
    connect_gate: Mutex<()>,
}

impl CacheClient {
    /// Client with the default policy, Tokio sleeper, and system clock.
    #[must_use]
    pub fn new(connector: Arc<dyn CacheConnector>) -> Self {
        Self::with_runtime(
            connector,
            ReconnectPolicy::default(),
            CacheClientRuntime::default(),
        )
    }

    /// Client with explicit policy and runtime collaborators.
    #[must_use]
    pub fn with_runtime(
        connector: Arc<dyn CacheConnector>,
        policy: ReconnectPolicy,
        runtime: CacheClientRuntime,
    ) -> Self {
        Self {
            connector,
            policy,
            runtime,
            state: RwLock::new(ConnectionState::Disconnected),
            connect_gate: Mutex::new(()),
        }
    }

    /// Current connection phase.
    #[must_use]
    pub fn phase(&self) -> CachePhase {
        self.read_state().phase()
    }

    /// Establish the store connection, retrying per the reconnect policy.
    ///
    /// Returns `true` once `Ready`. On refusal or when the attempt or window
    /// bound is exceeded the client settles in `Degraded` and returns `false`.
    pub async fn connect(&self) -> bool {
        let _gate = self.connect_gate.lock().await;
        if self.phase() == CachePhase::Ready {
            return true;
        }
        self.replace_state(ConnectionState::Connecting);

        let started = self.runtime.clock.utc();
        let mut attempt: u32 = 0;
        let reason = loop {
            attempt = attempt.saturating_add(1);
            let error = match self.connector.connect().await {
                Ok(store) => {
                    self.replace_state(ConnectionState::Ready(store));
                    info!(attempt, "cache store connected");
                    return true;
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                warn!(attempt, %error, "cache store refused connection; continuing without cache");
                break error.to_string();
            }
            if attempt >= self.policy.max_attempts {
                warn!(attempt, %error, "cache connect attempts exhausted; continuing without cache");
                break error.to_string();
            }
            let delay = self.policy.delay_for(attempt);
            let elapsed = self.elapsed_since(started);
            if elapsed.saturating_add(delay) > self.policy.retry_window {
                warn!(
                    attempt,
                    elapsed_ms = elapsed.as_millis(),
                    %error,
                    "cache connect retry window exhausted; continuing without cache"
                );
                break error.to_string();
            }
            debug!(attempt, delay_ms = delay.as_millis(), %error, "cache connect failed; retrying");
            self.runtime.sleeper.sleep(delay).await;
        };

        self.replace_state(ConnectionState::Degraded {
            store: None,
            reason,
        });
        false
    }

    /// Drop the store handle and return to `Disconnected`.
    pub fn disconnect(&self) {
        let previous = self.replace_state(ConnectionState::Disconnected);
        if previous.phase() != CachePhase::Disconnected {
            info!("cache client disconnected");
        }
    }

    /// Read and decode the value under `key`.
    ///
    /// Misses, undecodable values, store errors, and non-ready states all
    /// yield `None`.
    pub async fn get<T>(&self, key: &CacheKey) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let store = self.ready_store()?;
        let raw = match store.get(key).await {
            Ok(raw) => raw?,
            Err(error) => {
                self.record_failure(&store, "get", key.as_str(), &error);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(key = %key, %error, "discarding undecodable cache value");
                None
            }
        }
    }

    /// Encode `value` and store it under `key` for `ttl`.
    pub async fn set<T>(&self, key: &CacheKey, value: &T, ttl: Duration) -> bool
    where
        T: Serialize + Sync + ?Sized,
    {
        let Some(store) = self.ready_store() else {
            return false;
        };
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(error) => {
                warn!(key = %key, %error, "cache value could not be encoded");
                return false;
            }
        };
        match store.set(key, &encoded, ttl).await {
            Ok(()) => true,
            Err(error) => {
                self.record_failure(&store, "set", key.as_str(), &error);
                false
            }
        }
    }

    /// Remove `key`. Returns `true` only when an entry was removed.
    pub async fn delete(&self, key: &CacheKey) -> bool {
        let Some(store) = self.ready_store() else {
            return false;
        };
        match store.delete(key).await {
            Ok(removed) => removed,
            Err(error) => {
                self.record_failure(&store, "delete", key.as_str(), &error);
                false
            }
        }
    }

    /// Remove every key matching `pattern`; `*` clears the whole store.
    pub async fn flush(&self, pattern: &CachePattern) -> bool {
        let Some(store) = self.ready_store() else {
            return false;
        };
        let outcome = if pattern.is_all() {
            store.flush_all().await.map(|()| None)
        } else {
            store.delete_matching(pattern).await.map(Some)
        };
        match outcome {
            Ok(removed) => {
                info!(pattern = %pattern, removed = ?removed, "cache flushed");
                true
            }
            Err(error) => {
                self.record_failure(&store, "flush", pattern.as_str(), &error);
                false
            }
        }
    }

    /// Ping the store and report its health.
    ///
    /// A successful ping against a store retained after connection loss moves
    /// the client back to `Ready`.
    pub async fn health(&self) -> CacheHealth {
        let snapshot = self.read_state().clone();
        match snapshot {
            ConnectionState::Ready(store) => match store.ping().await {
                Ok(()) => CacheHealth::healthy(),
                Err(error) => {
                    self.record_failure(&store, "ping", "", &error);
                    CacheHealth::unhealthy(error.to_string())
                }
            },
            ConnectionState::Degraded {
                store: Some(store),
                reason,
            } => match store.ping().await {
                Ok(()) => {
                    if self.write_state().recover(&store) {
                        info!(previous_failure = %reason, "cache store recovered");
                    }
                    CacheHealth::healthy()
                }
                Err(error) => {
                    debug!(%error, "cache store still unreachable");
                    CacheHealth::disconnected()
                }
            },
            ConnectionState::Degraded {
                store: None,
                reason,
            } => {
                debug!(reason = %reason, "cache client degraded without a store");
                CacheHealth::disconnected()
            }
            ConnectionState::Disconnected | ConnectionState::Connecting => {
                CacheHealth::disconnected()
            }
        }
    }

    fn ready_store(&self) -> Option<Arc<dyn CacheStore>> {
        self.read_state().ready_store()
    }

    fn record_failure(
        &self,
        store: &Arc<dyn CacheStore>,
        operation: &'static str,
        target: &str,
        error: &CacheStoreError,
    ) {
        error!(operation, target, error_kind = error.kind(), %error, "cache operation failed");
        if error.is_connection_loss() && self.write_state().lose(store, error.to_string()) {
            warn!(%error, "cache store connection lost; operations are no-ops until it recovers");
        }
    }

    fn elapsed_since(&self, started: DateTime<Utc>) -> Duration {
        (self.runtime.clock.utc() - started)
            .to_std()
            .unwrap_or_default()
    }

    fn read_state(&self) -> RwLockReadGuard<'_, ConnectionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, ConnectionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn replace_state(&self, next: ConnectionState) -> ConnectionState {
        std::mem::replace(&mut *self.write_state(), next)
    }
}

#[async_trait]
impl CacheHealthQuery for CacheClient {
    async fn cache_health(&self) -> CacheHealth {
        self.health().await
    }
}
