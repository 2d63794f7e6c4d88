//! Firebase ID token verification against Google's published keys.

use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use mockable::Clock;
use serde::Deserialize;
use tracing::debug;

use super::jwks::{JwksCache, JwksError};
use crate::domain::ports::{IdentityVerifier, IdentityVerifierError};
use crate::domain::{BearerToken, Principal, UserId};

/// Allowed clock skew for `iat`, in seconds.
const ISSUED_AT_LEEWAY_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    iat: i64,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Verifies RS256 Firebase ID tokens for one project.
///
/// Checks signature, `exp`, `aud` (the project id), `iss`
/// (`https://securetoken.google.com/<project>`), a non-empty `sub`, and that
/// `iat` is not in the future.
pub struct FirebaseTokenVerifier {
    project_id: String,
    issuer: String,
    keys: Arc<JwksCache>,
    clock: Arc<dyn Clock>,
}

impl FirebaseTokenVerifier {
    #[must_use]
    pub fn new(project_id: impl Into<String>, keys: Arc<JwksCache>, clock: Arc<dyn Clock>) -> Self {
        let project_id = project_id.into();
        let issuer = format!("https://securetoken.google.com/{project_id}");
        Self {
            project_id,
            issuer,
            keys,
            clock,
        }
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "aud", "iss"]);
        validation
    }

    fn principal_from(&self, claims: FirebaseClaims) -> Result<Principal, IdentityVerifierError> {
        let now = self.clock.utc().timestamp();
        if claims.iat > now.saturating_add(ISSUED_AT_LEEWAY_SECS) {
            return Err(IdentityVerifierError::invalid_token("token issued in the future"));
        }
        let id = UserId::new(claims.sub)
            .map_err(|err| IdentityVerifierError::invalid_token(format!("invalid subject: {err}")))?;

        let mut principal = Principal::new(id);
        if let Some(email) = claims.email {
            principal = principal.with_email(email, claims.email_verified);
        }
        if let Some(name) = claims.name {
            principal = principal.with_display_name(name);
        }
        if let Some(picture) = claims.picture {
            principal = principal.with_picture_url(picture);
        }
        Ok(principal)
    }
}

fn map_key_error(err: JwksError) -> IdentityVerifierError {
    match err {
        JwksError::KeyNotFound(_) | JwksError::InvalidKey(_) => {
            IdentityVerifierError::invalid_token(err.to_string())
        }
        JwksError::Network(_) | JwksError::HttpStatus(_) | JwksError::Parse(_) => {
            IdentityVerifierError::upstream(err.to_string())
        }
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &BearerToken) -> Result<Principal, IdentityVerifierError> {
        let header = decode_header(token.expose())
            .map_err(|err| IdentityVerifierError::invalid_token(format!("malformed header: {err}")))?;
        if header.alg != Algorithm::RS256 {
            return Err(IdentityVerifierError::invalid_token(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| IdentityVerifierError::invalid_token("missing kid"))?;

        let key = self.keys.decoding_key(&kid).await.map_err(map_key_error)?;
        let data = decode::<FirebaseClaims>(token.expose(), &key, &self.validation())
            .map_err(|err| IdentityVerifierError::invalid_token(err.to_string()))?;
        debug!(kid = %kid, "identity token verified");
        self.principal_from(data.claims)
    }
}
