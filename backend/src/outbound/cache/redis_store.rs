//! Redis cache store backed by a `bb8` connection pool.
//!
//! The connector opens one dedicated connection to probe the server before
//! handing out a pooled store, so a refused or unreachable server surfaces as
//! a typed error instead of a checkout timeout on the first request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::bb8::{Pool, PooledConnection, RunError};
use bb8_redis::redis::{self, RedisError};
use bb8_redis::RedisConnectionManager;
use tracing::debug;

use crate::domain::ports::{CacheConnector, CacheKey, CachePattern, CacheStore, CacheStoreError};

/// Keys requested per `SCAN` round trip.
const SCAN_BATCH: u32 = 100;

/// Connection settings for the Redis pool.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use backend::outbound::cache::RedisPoolConfig;
///
/// let config = RedisPoolConfig::new("redis://localhost:6379")
///     .with_max_size(4)
///     .with_connection_timeout(Duration::from_secs(2));
/// assert_eq!(config.url(), "redis://localhost:6379");
/// ```
#[derive(Debug, Clone)]
pub struct RedisPoolConfig {
    url: String,
    max_size: u32,
    connection_timeout: Duration,
}

impl RedisPoolConfig {
    /// Configuration for `url` with a pool of 16 and a 5 second timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_size: 16,
            connection_timeout: Duration::from_secs(5),
        }
    }

    /// Set the maximum number of pooled connections.
    #[must_use]
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the connection checkout timeout.
    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Server URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Builds [`RedisCacheStore`] instances for the cache client.
#[derive(Debug, Clone)]
pub struct RedisCacheConnector {
    config: RedisPoolConfig,
}

impl RedisCacheConnector {
    #[must_use]
    pub fn new(config: RedisPoolConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CacheConnector for RedisCacheConnector {
    async fn connect(&self) -> Result<Arc<dyn CacheStore>, CacheStoreError> {
        let manager = RedisConnectionManager::new(self.config.url.as_str())
            .map_err(|err| CacheStoreError::configuration(err.to_string()))?;
        let pool = Pool::builder()
            .max_size(self.config.max_size)
            .connection_timeout(self.config.connection_timeout)
            .build(manager)
            .await
            .map_err(map_redis_error)?;

        let mut probe = pool.dedicated_connection().await.map_err(map_redis_error)?;
        let _: String = redis::cmd("PING")
            .query_async(&mut probe)
            .await
            .map_err(map_redis_error)?;
        debug!(max_size = self.config.max_size, "redis pool ready");

        Ok(Arc::new(RedisCacheStore { pool }))
    }
}

/// Pooled Redis implementation of [`CacheStore`].
#[derive(Clone)]
pub struct RedisCacheStore {
    pool: Pool<RedisConnectionManager>,
}

impl RedisCacheStore {
    async fn conn(&self) -> Result<PooledConnection<'_, RedisConnectionManager>, CacheStoreError> {
        self.pool.get().await.map_err(map_pool_error)
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheStoreError> {
        let mut conn = self.conn().await?;
        let value: Option<String> = redis::cmd("GET")
            .arg(key.as_str())
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        Ok(value)
    }

    async fn set(&self, key: &CacheKey, value: &str, ttl: Duration) -> Result<(), CacheStoreError> {
        let mut conn = self.conn().await?;
        // SET EX rejects zero; round sub-second TTLs up.
        let seconds = ttl.as_secs().max(1);
        let _: () = redis::cmd("SET")
            .arg(key.as_str())
            .arg(value)
            .arg("EX")
            .arg(seconds)
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<bool, CacheStoreError> {
        let mut conn = self.conn().await?;
        let removed: u64 = redis::cmd("DEL")
            .arg(key.as_str())
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        Ok(removed > 0)
    }

    async fn flush_all(&self) -> Result<(), CacheStoreError> {
        let mut conn = self.conn().await?;
        let _: () = redis::cmd("FLUSHALL")
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn delete_matching(&self, pattern: &CachePattern) -> Result<u64, CacheStoreError> {
        let mut conn = self.conn().await?;
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern.as_str())
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut *conn)
                .await
                .map_err(map_redis_error)?;
            if !keys.is_empty() {
                let deleted: u64 = redis::cmd("DEL")
                    .arg(keys)
                    .query_async(&mut *conn)
                    .await
                    .map_err(map_redis_error)?;
                removed = removed.saturating_add(deleted);
            }
            if next == 0 {
                return Ok(removed);
            }
            cursor = next;
        }
    }

    async fn ping(&self) -> Result<(), CacheStoreError> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }
}

fn map_redis_error(err: RedisError) -> CacheStoreError {
    if err.is_connection_refusal() {
        CacheStoreError::connection_refused(err.to_string())
    } else if err.is_io_error() || err.is_timeout() || err.is_connection_dropped() {
        CacheStoreError::connection(err.to_string())
    } else {
        CacheStoreError::command(err.to_string())
    }
}

fn map_pool_error(err: RunError<RedisError>) -> CacheStoreError {
    match err {
        RunError::User(inner) => map_redis_error(inner),
        RunError::TimedOut => {
            CacheStoreError::connection("timed out waiting for a pooled connection")
        }
    }
}
