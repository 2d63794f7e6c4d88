//! Runtime collaborators injected into the cache client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};

/// Suspends the reconnect loop between attempts.
#[async_trait]
pub trait ReconnectSleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl ReconnectSleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleep and time sources used while reconnecting.
#[derive(Clone)]
pub struct CacheClientRuntime {
    /// Async sleep implementation.
    pub sleeper: Arc<dyn ReconnectSleeper>,
    /// Clock measuring the retry window.
    pub clock: Arc<dyn Clock>,
}

impl Default for CacheClientRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            clock: Arc::new(DefaultClock),
        }
    }
}
