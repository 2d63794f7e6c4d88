//! Per-user payloads served through the cache-aside layer.
//!
//! These are stored verbatim as cache values and returned to callers, so the
//! serialised field names are the wire contract.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::Principal;
use super::ports::{CacheKey, CachePattern};

const DATA_GREETING: &str = "Hello from the backend!";
const NAME_PLACEHOLDER: &str = "Not provided";

/// Render a timestamp the way every payload in this service does.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Payload of the data endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub message: String,
    pub timestamp: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    pub authenticated: bool,
}

impl UserData {
    /// Build the payload for `principal` as of `now`.
    #[must_use]
    pub fn compute(principal: &Principal, now: DateTime<Utc>) -> Self {
        Self {
            message: DATA_GREETING.to_owned(),
            timestamp: format_timestamp(now),
            user_id: principal.id().to_string(),
            user_email: principal.email().map(str::to_owned),
            authenticated: true,
        }
    }
}

/// Payload of the profile endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub email_verified: bool,
    pub name: String,
    pub picture: Option<String>,
}

impl UserProfile {
    /// Build the profile view of `principal`.
    #[must_use]
    pub fn compute(principal: &Principal) -> Self {
        Self {
            uid: principal.id().to_string(),
            email: principal.email().map(str::to_owned),
            email_verified: principal.email_verified(),
            name: principal
                .display_name()
                .unwrap_or(NAME_PLACEHOLDER)
                .to_owned(),
            picture: principal.picture_url().map(str::to_owned),
        }
    }
}

/// A payload tagged with whether it came from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cached<T> {
    pub payload: T,
    pub cached: bool,
}

impl<T> Cached<T> {
    /// Payload served from the cache.
    pub fn hit(payload: T) -> Self {
        Self {
            payload,
            cached: true,
        }
    }

    /// Payload computed for this request.
    pub fn miss(payload: T) -> Self {
        Self {
            payload,
            cached: false,
        }
    }
}

/// Result of a successful flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushOutcome {
    /// Pattern that was applied.
    pub pattern: CachePattern,
    /// Whether the caller named the pattern rather than relying on the default.
    pub explicit: bool,
}

/// Keys removed when a user's cache is cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearedUserCache {
    pub keys: Vec<CacheKey>,
}
