//! Driven port for bearer token verification.
//!
//! Implementations call out to an external identity provider on every request;
//! verification results are never cached.

use std::collections::HashMap;

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{BearerToken, Principal};

define_port_error! {
    /// Reasons a token could not be turned into a [`Principal`].
    pub enum IdentityVerifierError {
        /// The token is malformed, expired, or fails signature or claim checks.
        InvalidToken { message: String } => "identity token rejected: {message}",
        /// The identity provider or its key material could not be reached.
        Upstream { message: String } => "identity provider unavailable: {message}",
    }
}

/// Verify bearer tokens and resolve them to principals.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `token`, returning the principal it identifies.
    async fn verify(&self, token: &BearerToken) -> Result<Principal, IdentityVerifierError>;
}

/// Verifier used when no identity provider project could be resolved.
///
/// Every token is rejected as an upstream failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredIdentityVerifier;

#[async_trait]
impl IdentityVerifier for UnconfiguredIdentityVerifier {
    async fn verify(&self, _token: &BearerToken) -> Result<Principal, IdentityVerifierError> {
        Err(IdentityVerifierError::upstream(
            "identity provider credentials are not configured",
        ))
    }
}

/// Deterministic verifier accepting a fixed token table.
///
/// # Examples
/// ```
/// use backend::domain::{BearerToken, Principal, UserId};
/// use backend::domain::ports::{FixtureIdentityVerifier, IdentityVerifier};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let principal = Principal::new(UserId::new("u1").expect("id"));
/// let verifier = FixtureIdentityVerifier::default().with_token("t1", principal.clone());
/// let token = BearerToken::new("t1").expect("token");
/// assert_eq!(verifier.verify(&token).await.ok(), Some(principal));
/// # });
/// ```
#[derive(Debug, Default, Clone)]
pub struct FixtureIdentityVerifier {
    tokens: HashMap<String, Principal>,
}

impl FixtureIdentityVerifier {
    /// Accept `token` as proof of `principal`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.tokens.insert(token.into(), principal);
        self
    }
}

#[async_trait]
impl IdentityVerifier for FixtureIdentityVerifier {
    async fn verify(&self, token: &BearerToken) -> Result<Principal, IdentityVerifierError> {
        self.tokens
            .get(token.expose())
            .cloned()
            .ok_or_else(|| IdentityVerifierError::invalid_token("unknown fixture token"))
    }
}
