//! Driven ports for the remote key-value cache.
//!
//! [`CacheStore`] speaks raw strings; JSON encoding and the degraded-mode
//! policy live in [`crate::domain::CacheClient`]. [`CacheConnector`] builds a
//! store so the client can own its reconnection state machine.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{CacheKey, CachePattern, define_port_error};

define_port_error! {
    /// Errors surfaced by cache store adapters.
    pub enum CacheStoreError {
        /// The store actively refused the connection. Retrying will not help.
        ConnectionRefused { message: String } => "cache store refused connection: {message}",
        /// The connection dropped, timed out, or could not be established.
        Connection { message: String } => "cache store connection failed: {message}",
        /// The store rejected or failed a command on a healthy connection.
        Command { message: String } => "cache store command failed: {message}",
        /// The adapter is misconfigured, for example with an unparsable URL.
        Configuration { message: String } => "cache store configuration invalid: {message}",
    }
}

impl CacheStoreError {
    /// Whether a connect attempt failing with this error may be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::ConnectionRefused { .. } | Self::Configuration { .. }
        )
    }

    /// Whether the error means the store is no longer reachable.
    #[must_use]
    pub fn is_connection_loss(&self) -> bool {
        matches!(
            self,
            Self::ConnectionRefused { .. } | Self::Connection { .. }
        )
    }
}

/// Raw key-value operations against a connected store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the raw value stored under `key`.
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheStoreError>;

    /// Store `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &CacheKey, value: &str, ttl: Duration) -> Result<(), CacheStoreError>;

    /// Remove `key`, reporting whether an entry existed.
    async fn delete(&self, key: &CacheKey) -> Result<bool, CacheStoreError>;

    /// Remove every key in the store.
    async fn flush_all(&self) -> Result<(), CacheStoreError>;

    /// Remove keys matching a glob pattern, returning how many were removed.
    async fn delete_matching(&self, pattern: &CachePattern) -> Result<u64, CacheStoreError>;

    /// Round-trip liveness check.
    async fn ping(&self) -> Result<(), CacheStoreError>;
}

/// Factory establishing connections to a cache store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheConnector: Send + Sync {
    /// Open a connection, verifying the store answers before returning.
    async fn connect(&self) -> Result<Arc<dyn CacheStore>, CacheStoreError>;
}

/// Connector for deployments and tests that run without a cache store.
///
/// Every attempt is refused, so a client built on it settles in degraded mode
/// after one attempt.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableCacheConnector;

#[async_trait]
impl CacheConnector for UnavailableCacheConnector {
    async fn connect(&self) -> Result<Arc<dyn CacheStore>, CacheStoreError> {
        Err(CacheStoreError::connection_refused("no cache store configured"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(CacheStoreError::connection_refused("x"), false, true)]
    #[case(CacheStoreError::connection("x"), true, true)]
    #[case(CacheStoreError::command("x"), true, false)]
    #[case(CacheStoreError::configuration("x"), false, false)]
    fn classifies_errors(
        #[case] error: CacheStoreError,
        #[case] retryable: bool,
        #[case] connection_loss: bool,
    ) {
        assert_eq!(error.is_retryable(), retryable);
        assert_eq!(error.is_connection_loss(), connection_loss);
    }

    #[tokio::test]
    async fn unavailable_connector_refuses() {
        let Err(error) = UnavailableCacheConnector.connect().await else {
            panic!("connector must refuse");
        };
        assert_eq!(error.kind(), "connection_refused");
    }
}
