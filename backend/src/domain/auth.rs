//! Bearer token primitive handed to identity verifiers.
//!
//! Header parsing stays in the inbound adapter; this type only guarantees the
//! token is present and scrubs it from memory on drop.

use std::fmt;

use zeroize::Zeroizing;

/// Raised when a bearer token value is unusable before verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BearerTokenError {
    /// The token was missing or blank once trimmed.
    #[error("bearer token must not be empty")]
    Empty,
}

/// Opaque identity token presented by a caller.
///
/// ## Invariants
/// - The token is trimmed and non-empty.
/// - `Debug` never prints the token.
///
/// # Examples
/// ```
/// use backend::domain::BearerToken;
///
/// let token = BearerToken::new("  eyJhbGciOi  ").expect("token present");
/// assert_eq!(token.expose(), "eyJhbGciOi");
/// assert!(BearerToken::new(" ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(Zeroizing<String>);

impl BearerToken {
    /// Validate a raw token value.
    pub fn new(raw: &str) -> Result<Self, BearerTokenError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BearerTokenError::Empty);
        }
        Ok(Self(Zeroizing::new(trimmed.to_owned())))
    }

    /// Token text for forwarding to the verifier.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}
