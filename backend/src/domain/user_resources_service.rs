//! Cache-aside service behind the per-user endpoints.
//!
//! Reads consult the cache first and fall back to computing the payload from
//! the principal; computed payloads are written back with the namespace TTL.
//! The cache never affects correctness: every cache outcome other than a hit
//! is treated as a miss, and failed writes are ignored.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::ports::{
    CacheAdminCommand, CacheKey, CacheNamespace, CachePattern, UserResourcesQuery,
};
use super::{
    CacheClient, Cached, ClearedUserCache, Error, FlushOutcome, Principal, UserData, UserId,
    UserProfile,
};

const FLUSH_FAILED: &str = "Failed to flush cache";
const FOREIGN_USER: &str = "Cannot clear cache for another user";

/// Cache-aside implementation of the user resource ports.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use backend::domain::{CacheClient, Principal, UserId, UserResourcesService};
/// use backend::domain::ports::{UnavailableCacheConnector, UserResourcesQuery};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let cache = Arc::new(CacheClient::new(Arc::new(UnavailableCacheConnector)));
/// let service = UserResourcesService::new(cache, Arc::new(mockable::DefaultClock));
/// let principal = Principal::new(UserId::new("u1").expect("id"));
///
/// let data = service.user_data(&principal).await.expect("data");
/// assert!(!data.cached);
/// assert_eq!(data.payload.user_id, "u1");
/// # });
/// ```
#[derive(Clone)]
pub struct UserResourcesService {
    cache: Arc<CacheClient>,
    clock: Arc<dyn Clock>,
}

impl UserResourcesService {
    /// Build the service over a shared cache client.
    #[must_use]
    pub fn new(cache: Arc<CacheClient>, clock: Arc<dyn Clock>) -> Self {
        Self { cache, clock }
    }

    async fn cache_aside<T, F>(&self, key: CacheKey, ttl: Duration, compute: F) -> Cached<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> T + Send,
    {
        if let Some(hit) = self.cache.get::<T>(&key).await {
            debug!(key = %key, "serving payload from cache");
            return Cached::hit(hit);
        }

        let payload = compute();
        if !self.cache.set(&key, &payload, ttl).await {
            debug!(key = %key, "payload served uncached");
        }
        Cached::miss(payload)
    }
}

#[async_trait]
impl UserResourcesQuery for UserResourcesService {
    async fn user_data(&self, principal: &Principal) -> Result<Cached<UserData>, Error> {
        let namespace = CacheNamespace::UserData;
        let key = CacheKey::for_user(namespace, principal.id());
        let now = self.clock.utc();
        Ok(self
            .cache_aside(key, namespace.ttl(), || UserData::compute(principal, now))
            .await)
    }

    async fn user_profile(&self, principal: &Principal) -> Result<Cached<UserProfile>, Error> {
        let namespace = CacheNamespace::UserProfile;
        let key = CacheKey::for_user(namespace, principal.id());
        Ok(self
            .cache_aside(key, namespace.ttl(), || UserProfile::compute(principal))
            .await)
    }
}

#[async_trait]
impl CacheAdminCommand for UserResourcesService {
    async fn flush(
        &self,
        principal: &Principal,
        pattern: Option<CachePattern>,
    ) -> Result<FlushOutcome, Error> {
        let explicit = pattern.is_some();
        let pattern = pattern.unwrap_or_else(CachePattern::all);
        // Any authenticated caller may flush; there is no role model.
        warn!(user_id = %principal.id(), pattern = %pattern, "cache flush requested");

        if self.cache.flush(&pattern).await {
            Ok(FlushOutcome { pattern, explicit })
        } else {
            Err(Error::operation_failed(FLUSH_FAILED))
        }
    }

    async fn clear_user(
        &self,
        principal: &Principal,
        target: &UserId,
    ) -> Result<ClearedUserCache, Error> {
        if principal.id() != target {
            warn!(
                user_id = %principal.id(),
                target = %target,
                "rejected cache clear for another user"
            );
            return Err(Error::forbidden(FOREIGN_USER));
        }

        let keys: Vec<CacheKey> = CacheNamespace::ALL
            .into_iter()
            .map(|namespace| CacheKey::for_user(namespace, target))
            .collect();
        for key in &keys {
            if !self.cache.delete(key).await {
                debug!(key = %key, "no cache entry removed");
            }
        }
        Ok(ClearedUserCache { keys })
    }
}
