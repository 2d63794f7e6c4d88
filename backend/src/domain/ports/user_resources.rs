//! Driving ports used by the HTTP adapter.
//!
//! Handlers depend on these traits rather than on the cache client so they can
//! be exercised with mocks or with the real service over an in-memory store.

use async_trait::async_trait;

use super::CachePattern;
use crate::domain::{
    CacheHealth, Cached, ClearedUserCache, Error, FlushOutcome, Principal, UserData, UserId,
    UserProfile,
};

/// Cache-aside reads of per-user resources.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserResourcesQuery: Send + Sync {
    /// Data payload for `principal`, from cache when present.
    async fn user_data(&self, principal: &Principal) -> Result<Cached<UserData>, Error>;

    /// Profile payload for `principal`, from cache when present.
    async fn user_profile(&self, principal: &Principal) -> Result<Cached<UserProfile>, Error>;
}

/// Administrative cache invalidation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheAdminCommand: Send + Sync {
    /// Remove entries matching `pattern`, or everything when `None`.
    async fn flush(
        &self,
        principal: &Principal,
        pattern: Option<CachePattern>,
    ) -> Result<FlushOutcome, Error>;

    /// Remove every per-user entry belonging to `target`.
    async fn clear_user(
        &self,
        principal: &Principal,
        target: &UserId,
    ) -> Result<ClearedUserCache, Error>;
}

/// Cache connectivity report for health endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheHealthQuery: Send + Sync {
    /// Probe the cache and describe its state.
    async fn cache_health(&self) -> CacheHealth;
}
