//! Cache key and pattern types shared by cache adapters.
use std::time::Duration;

use thiserror::Error;

use crate::domain::UserId;

/// Per-user resource families memoised in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    /// Payload served by the data endpoint.
    UserData,
    /// Payload served by the profile endpoint.
    UserProfile,
}

impl CacheNamespace {
    /// Every namespace holding per-user entries.
    pub const ALL: [Self; 2] = [Self::UserData, Self::UserProfile];

    /// Key prefix for this namespace.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserData => "user_data",
            Self::UserProfile => "user_profile",
        }
    }

    /// Expiry applied when entries in this namespace are written.
    #[must_use]
    pub const fn ttl(self) -> Duration {
        match self {
            Self::UserData => Duration::from_secs(300),
            Self::UserProfile => Duration::from_secs(3600),
        }
    }
}

fn validate(raw: String) -> Result<String, CacheKeyValidationError> {
    if raw.trim().is_empty() {
        return Err(CacheKeyValidationError::Empty);
    }
    if raw.chars().any(char::is_whitespace) {
        return Err(CacheKeyValidationError::ContainsWhitespace);
    }
    if raw.chars().any(char::is_control) {
        return Err(CacheKeyValidationError::ContainsControl);
    }
    Ok(raw)
}

/// Key addressing a single cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Construct a key after validating that it is non-empty and free of
    /// whitespace and control characters.
    pub fn new(value: impl Into<String>) -> Result<Self, CacheKeyValidationError> {
        validate(value.into()).map(Self)
    }

    /// `<namespace>:<user id>` key for a principal's entry.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::UserId;
    /// use backend::domain::ports::{CacheKey, CacheNamespace};
    ///
    /// let id = UserId::new("u1").expect("id");
    /// let key = CacheKey::for_user(CacheNamespace::UserProfile, &id);
    /// assert_eq!(key.as_str(), "user_profile:u1");
    /// ```
    #[must_use]
    pub fn for_user(namespace: CacheNamespace, user: &UserId) -> Self {
        Self(format!("{}:{user}", namespace.as_str()))
    }

    /// Borrow the underlying key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Glob pattern selecting keys for bulk removal.
///
/// `*` selects the entire store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CachePattern(String);

impl CachePattern {
    const MATCH_ALL: &'static str = "*";

    /// Pattern matching every key.
    #[must_use]
    pub fn all() -> Self {
        Self(Self::MATCH_ALL.to_owned())
    }

    /// Validate a caller-supplied pattern.
    pub fn new(value: impl Into<String>) -> Result<Self, CacheKeyValidationError> {
        validate(value.into()).map(Self)
    }

    /// Whether the pattern clears the whole store.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.0 == Self::MATCH_ALL
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for CachePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors returned when constructing keys or patterns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheKeyValidationError {
    /// Value is empty after trimming whitespace.
    #[error("cache key must not be empty")]
    Empty,
    /// Value contains whitespace.
    #[error("cache key must not contain whitespace")]
    ContainsWhitespace,
    /// Value contains a control character.
    #[error("cache key must not contain control characters")]
    ContainsControl,
}
