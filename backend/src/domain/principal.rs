//! Verified caller identity.
//!
//! A [`Principal`] is produced per request by an identity verifier and is
//! never persisted. Its [`UserId`] is the only input used to derive cache
//! keys, so the identifier is validated before it can reach the cache.

use std::fmt;

use serde::Serialize;

/// Longest identifier the identity provider issues.
pub const USER_ID_MAX_LEN: usize = 128;

/// Validation failures for [`UserId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserIdError {
    /// Identifier was empty.
    #[error("user id must not be empty")]
    Empty,
    /// Identifier exceeded [`USER_ID_MAX_LEN`] characters.
    #[error("user id must be at most {max} characters")]
    TooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// Identifier contained whitespace or control characters.
    #[error("user id must not contain whitespace or control characters")]
    InvalidCharacter,
}

/// Opaque identity-provider subject.
///
/// # Examples
/// ```
/// use backend::domain::UserId;
///
/// let id = UserId::new("u1").expect("valid id");
/// assert_eq!(id.as_ref(), "u1");
/// assert!(UserId::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Validate and wrap an identifier.
    pub fn new(raw: impl Into<String>) -> Result<Self, UserIdError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(UserIdError::Empty);
        }
        if raw.chars().count() > USER_ID_MAX_LEN {
            return Err(UserIdError::TooLong {
                max: USER_ID_MAX_LEN,
            });
        }
        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(UserIdError::InvalidCharacter);
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity verified for the current request.
///
/// # Examples
/// ```
/// use backend::domain::{Principal, UserId};
///
/// let principal = Principal::new(UserId::new("u1").expect("id"))
///     .with_email("a@b.com", true)
///     .with_display_name("Ada");
/// assert_eq!(principal.email(), Some("a@b.com"));
/// assert!(principal.email_verified());
/// assert_eq!(principal.picture_url(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    id: UserId,
    email: Option<String>,
    email_verified: bool,
    display_name: Option<String>,
    picture_url: Option<String>,
}

impl Principal {
    /// Principal with only an identifier; optional attributes start empty.
    #[must_use]
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            email: None,
            email_verified: false,
            display_name: None,
            picture_url: None,
        }
    }

    /// Attach the email address and its verification flag.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>, verified: bool) -> Self {
        self.email = Some(email.into());
        self.email_verified = verified;
        self
    }

    /// Attach a display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Attach a profile picture URL.
    #[must_use]
    pub fn with_picture_url(mut self, url: impl Into<String>) -> Self {
        self.picture_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &UserId {
        &self.id
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    #[must_use]
    pub fn email_verified(&self) -> bool {
        self.email_verified
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    #[must_use]
    pub fn picture_url(&self) -> Option<&str> {
        self.picture_url.as_deref()
    }
}
