//! Signing key cache for the identity provider's published JWKS.
//!
//! Keys are fetched over HTTPS and held until the `Cache-Control: max-age`
//! reported by the endpoint elapses, clamped to [`JwksCacheConfig`] bounds.
//! A token naming an unknown `kid` triggers one refresh before it is rejected,
//! so rotated keys are picked up. Such refreshes are rate limited by
//! [`JwksCacheConfig::with_min_refresh_interval`]; within that interval an
//! unknown `kid` is rejected from the cached set without a fetch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::JwkSet;
use mockable::Clock;
use reqwest::header::{ACCEPT, CACHE_CONTROL, HeaderMap};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

/// Google's published keys for Firebase ID tokens.
pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Failures fetching or using the key set.
#[derive(Debug, thiserror::Error)]
pub enum JwksError {
    #[error("failed to fetch JWKS: {0}")]
    Network(String),

    #[error("JWKS endpoint returned HTTP {0}")]
    HttpStatus(u16),

    #[error("failed to parse JWKS: {0}")]
    Parse(String),

    #[error("no signing key with kid '{0}'")]
    KeyNotFound(String),

    #[error("unusable signing key: {0}")]
    InvalidKey(String),
}

/// Lifetime bounds and HTTP settings for [`JwksCache`].
#[derive(Debug, Clone)]
pub struct JwksCacheConfig {
    url: Url,
    default_ttl: Duration,
    min_ttl: Duration,
    max_ttl: Duration,
    request_timeout: Duration,
    min_refresh_interval: Duration,
}

impl JwksCacheConfig {
    /// Build a configuration for `url` with a one hour default lifetime.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            url,
            default_ttl: Duration::from_secs(3600),
            min_ttl: Duration::from_secs(60),
            max_ttl: Duration::from_secs(24 * 3600),
            request_timeout: Duration::from_secs(10),
            min_refresh_interval: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Minimum time between fetches forced by an unknown `kid`.
    ///
    /// Expired key sets are always refetched regardless of this interval.
    #[must_use]
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn ttl_from(&self, headers: &HeaderMap) -> Duration {
        headers
            .get(CACHE_CONTROL)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| {
                value.split(',').find_map(|directive| {
                    directive
                        .trim()
                        .strip_prefix("max-age=")
                        .and_then(|secs| secs.parse::<u64>().ok())
                })
            })
            .map_or(self.default_ttl, Duration::from_secs)
            .clamp(self.min_ttl, self.max_ttl)
    }
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Shared, lazily refreshed JWKS.
pub struct JwksCache {
    config: JwksCacheConfig,
    http: reqwest::Client,
    clock: Arc<dyn Clock>,
    cached: RwLock<Option<CachedKeys>>,
}

impl JwksCache {
    /// Build a cache with its own HTTP client.
    ///
    /// # Errors
    /// Returns [`JwksError::Network`] when the HTTP client cannot be built.
    pub fn new(config: JwksCacheConfig, clock: Arc<dyn Clock>) -> Result<Self, JwksError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| JwksError::Network(err.to_string()))?;
        Ok(Self {
            config,
            http,
            clock,
            cached: RwLock::new(None),
        })
    }

    /// Resolve the decoding key for `kid`.
    ///
    /// Serves from the cache while it is fresh. An expired cache triggers a
    /// refresh; a miss on a fresh cache triggers one only when the last fetch
    /// is older than the minimum refresh interval.
    ///
    /// # Errors
    /// Fails when the endpoint cannot be read or still lacks `kid` after a
    /// refresh.
    pub async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, JwksError> {
        if let Some(key) = self.lookup_fresh(kid).await? {
            return Ok(key);
        }
        if self.recently_fetched().await {
            debug!(kid, "unknown kid within refresh interval; not refetching");
            return Err(JwksError::KeyNotFound(kid.to_owned()));
        }
        self.refresh().await?;
        self.lookup_fresh(kid)
            .await?
            .ok_or_else(|| JwksError::KeyNotFound(kid.to_owned()))
    }

    async fn recently_fetched(&self) -> bool {
        let guard = self.cached.read().await;
        let Some(cached) = guard.as_ref() else {
            return false;
        };
        let now = self.clock.utc();
        let interval =
            TimeDelta::from_std(self.config.min_refresh_interval).unwrap_or(TimeDelta::MAX);
        cached.expires_at > now
            && cached
                .fetched_at
                .checked_add_signed(interval)
                .is_none_or(|until| now < until)
    }

    async fn lookup_fresh(&self, kid: &str) -> Result<Option<DecodingKey>, JwksError> {
        let guard = self.cached.read().await;
        let Some(cached) = guard.as_ref() else {
            return Ok(None);
        };
        if cached.expires_at <= self.clock.utc() {
            return Ok(None);
        }
        cached
            .keys
            .find(kid)
            .map(|jwk| DecodingKey::from_jwk(jwk).map_err(|err| JwksError::InvalidKey(err.to_string())))
            .transpose()
    }

    /// Fetch the key set and replace the cached copy.
    ///
    /// # Errors
    /// Returns network, status, or parse errors from the endpoint. The
    /// previous copy is kept on failure.
    pub async fn refresh(&self) -> Result<(), JwksError> {
        debug!(url = %self.config.url, "fetching identity provider keys");
        let response = self
            .http
            .get(self.config.url.as_str())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| {
                warn!(url = %self.config.url, error = %err, "JWKS fetch failed");
                JwksError::Network(err.to_string())
            })?;

        if !response.status().is_success() {
            return Err(JwksError::HttpStatus(response.status().as_u16()));
        }

        let ttl = self.config.ttl_from(response.headers());
        let keys: JwkSet = response
            .json()
            .await
            .map_err(|err| JwksError::Parse(err.to_string()))?;

        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::hours(1));
        debug!(keys = keys.keys.len(), ttl_secs = ttl.num_seconds(), "cached identity provider keys");
        let now = self.clock.utc();
        *self.cached.write().await = Some(CachedKeys {
            keys,
            fetched_at: now,
            expires_at: now + ttl,
        });
        Ok(())
    }
}
