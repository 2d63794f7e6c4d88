//! Request and response bodies for the HTTP adapter, plus OpenAPI schema
//! wrappers for domain payloads.
//!
//! Domain types stay framework-agnostic by not deriving `ToSchema`; the
//! wrappers below mirror their JSON shape under the domain type's name.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{CacheHealth, Cached};

/// Error envelope returned for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable message safe to show to clients.
    #[schema(example = "Access token required")]
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Payload plus the cache-hit flag.
#[derive(Debug, Serialize)]
pub struct CachedPayload<T> {
    #[serde(flatten)]
    pub payload: T,
    pub cached: bool,
}

impl<T> From<Cached<T>> for CachedPayload<T> {
    fn from(value: Cached<T>) -> Self {
        Self {
            payload: value.payload,
            cached: value.cached,
        }
    }
}

/// Body of `GET /`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RootResponse {
    #[schema(example = "Backend API is running!")]
    pub message: String,
    #[schema(example = "2026-04-02T12:00:00.000Z")]
    pub timestamp: String,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "OK")]
    pub status: String,
    pub timestamp: String,
    #[schema(example = "backend-api")]
    pub service: String,
    #[schema(value_type = CacheHealthSchema)]
    pub redis: CacheHealth,
}

/// Optional body of `POST /api/cache/flush`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct FlushRequest {
    /// Glob pattern; absent or empty flushes everything.
    #[schema(example = "user_data:*")]
    #[serde(default)]
    pub pattern: Option<String>,
}

/// Body of a successful flush.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FlushResponse {
    #[schema(example = "Cache flushed successfully for pattern: user_data:*")]
    pub message: String,
    #[schema(example = "user_data:*")]
    pub pattern: String,
}

/// Body of a successful per-user clear.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClearUserCacheResponse {
    #[schema(example = "Cache cleared for user: u1")]
    pub message: String,
    #[schema(example = json!(["user_data:u1", "user_profile:u1"]))]
    pub cleared_keys: Vec<String>,
}

/// OpenAPI schema for [`crate::domain::CacheHealth`].
#[derive(ToSchema)]
#[schema(as = crate::domain::CacheHealth)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct CacheHealthSchema {
    /// One of `healthy`, `unhealthy`, `disconnected`.
    #[schema(example = "healthy")]
    status: String,
    #[schema(example = "Cache store is responding")]
    message: String,
}

/// OpenAPI schema for the `GET /api/data` body.
#[derive(ToSchema)]
#[schema(as = crate::domain::UserData, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct UserDataSchema {
    #[schema(example = "Hello from the backend!")]
    message: String,
    timestamp: String,
    user_id: String,
    user_email: Option<String>,
    authenticated: bool,
    /// Whether the payload was served from the cache.
    cached: bool,
}

/// OpenAPI schema for the `GET /api/profile` body.
#[derive(ToSchema)]
#[schema(as = crate::domain::UserProfile, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct UserProfileSchema {
    uid: String,
    email: Option<String>,
    email_verified: bool,
    #[schema(example = "Not provided")]
    name: String,
    picture: Option<String>,
    /// Whether the payload was served from the cache.
    cached: bool,
}
