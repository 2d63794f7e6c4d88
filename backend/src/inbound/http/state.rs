//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    CacheAdminCommand, CacheHealthQuery, IdentityVerifier, UserResourcesQuery,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub identity: Arc<dyn IdentityVerifier>,
    pub resources: Arc<dyn UserResourcesQuery>,
    pub cache_admin: Arc<dyn CacheAdminCommand>,
    pub cache_health: Arc<dyn CacheHealthQuery>,
    pub clock: Arc<dyn Clock>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub identity: Arc<dyn IdentityVerifier>,
    pub resources: Arc<dyn UserResourcesQuery>,
    pub cache_admin: Arc<dyn CacheAdminCommand>,
    pub cache_health: Arc<dyn CacheHealthQuery>,
    pub clock: Arc<dyn Clock>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use backend::domain::{CacheClient, UserResourcesService};
    /// use backend::domain::ports::{UnavailableCacheConnector, UnconfiguredIdentityVerifier};
    /// use backend::inbound::http::state::{HttpState, HttpStatePorts};
    /// use mockable::DefaultClock;
    ///
    /// let cache = Arc::new(CacheClient::new(Arc::new(UnavailableCacheConnector)));
    /// let service = Arc::new(UserResourcesService::new(cache.clone(), Arc::new(DefaultClock)));
    /// let state = HttpState::new(HttpStatePorts {
    ///     identity: Arc::new(UnconfiguredIdentityVerifier),
    ///     resources: service.clone(),
    ///     cache_admin: service,
    ///     cache_health: cache,
    ///     clock: Arc::new(DefaultClock),
    /// });
    /// let _identity = state.identity.clone();
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            identity,
            resources,
            cache_admin,
            cache_health,
            clock,
        } = ports;
        Self {
            identity,
            resources,
            cache_admin,
            cache_health,
            clock,
        }
    }
}
