//! Builders wiring outbound adapters into the HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock, DefaultEnv};
use tracing::{info, warn};

use backend::domain::ports::{IdentityVerifier, UnconfiguredIdentityVerifier};
use backend::domain::{CacheClient, UserResourcesService};
use backend::inbound::http::state::{HttpState, HttpStatePorts};
use backend::outbound::cache::{RedisCacheConnector, RedisPoolConfig};
use backend::outbound::identity::{
    ApplicationDefaultCredentials, CredentialProvider, FirebaseTokenVerifier, JwksCache,
    JwksCacheConfig, ServiceAccountKeyFile, resolve_identity_project,
};
use backend::settings::AppSettings;

/// Long-lived components shared by every server worker.
pub(crate) struct AppComponents {
    pub(crate) cache: Arc<CacheClient>,
    pub(crate) http_state: web::Data<HttpState>,
}

/// Build the cache client over a Redis pool. No connection is attempted yet.
fn build_cache_client(settings: &AppSettings) -> Arc<CacheClient> {
    let pool = RedisPoolConfig::new(settings.redis_url.clone()).with_max_size(settings.redis_pool_size);
    Arc::new(CacheClient::new(Arc::new(RedisCacheConnector::new(pool))))
}

/// Resolve the identity project and build a verifier for it.
///
/// Falls back to [`UnconfiguredIdentityVerifier`] so the API still starts,
/// rejecting every token, when no credential source is usable.
fn build_identity_verifier(settings: &AppSettings, clock: Arc<dyn Clock>) -> Arc<dyn IdentityVerifier> {
    let providers: Vec<Box<dyn CredentialProvider>> = vec![
        Box::new(ServiceAccountKeyFile::new(settings.service_account_file.clone())),
        Box::new(ApplicationDefaultCredentials::new(DefaultEnv::new())),
    ];
    let project_id = match resolve_identity_project(&providers) {
        Ok(project_id) => project_id,
        Err(error) => {
            warn!(%error, "identity provider not configured; every token will be rejected");
            return Arc::new(UnconfiguredIdentityVerifier);
        }
    };

    let config = JwksCacheConfig::new(settings.jwks_url.clone());
    match JwksCache::new(config, Arc::clone(&clock)) {
        Ok(keys) => {
            info!(%project_id, jwks_url = %settings.jwks_url, "identity verifier ready");
            Arc::new(FirebaseTokenVerifier::new(project_id, Arc::new(keys), clock))
        }
        Err(error) => {
            warn!(%error, "failed to build JWKS client; every token will be rejected");
            Arc::new(UnconfiguredIdentityVerifier)
        }
    }
}

/// Build every shared component from settings.
pub(crate) fn build_components(settings: &AppSettings) -> AppComponents {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let cache = build_cache_client(settings);
    let service = Arc::new(UserResourcesService::new(Arc::clone(&cache), Arc::clone(&clock)));
    let identity = build_identity_verifier(settings, Arc::clone(&clock));

    let http_state = web::Data::new(HttpState::new(HttpStatePorts {
        identity,
        resources: service.clone(),
        cache_admin: service,
        cache_health: cache.clone(),
        clock,
    }));
    AppComponents { cache, http_state }
}
