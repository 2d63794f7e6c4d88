//! Bearer authentication for HTTP handlers.
//!
//! Handlers take an [`AuthenticatedPrincipal`] argument; extraction parses the
//! `Authorization` header and asks the configured identity verifier. Missing
//! credentials are 401, rejected credentials are 403.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use super::state::HttpState;
use crate::domain::{BearerToken, Error, Principal};

pub const ACCESS_TOKEN_REQUIRED: &str = "Access token required";
pub const INVALID_TOKEN: &str = "Invalid token";

/// Extract the bearer token from an `Authorization` header value.
///
/// The scheme is matched case-insensitively.
///
/// # Examples
/// ```
/// use backend::inbound::http::auth::parse_bearer;
///
/// assert_eq!(parse_bearer("bearer abc").map(|t| t.expose().to_owned()), Some("abc".into()));
/// assert!(parse_bearer("Basic abc").is_none());
/// assert!(parse_bearer("Bearer ").is_none());
/// ```
#[must_use]
pub fn parse_bearer(header: &str) -> Option<BearerToken> {
    let (scheme, token) = header.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    BearerToken::new(token).ok()
}

fn bearer_from(req: &HttpRequest) -> Result<BearerToken, Error> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer)
        .ok_or_else(|| Error::unauthorized(ACCESS_TOKEN_REQUIRED))
}

/// Verified caller identity for the current request.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal(pub Principal);

impl AuthenticatedPrincipal {
    #[must_use]
    pub fn into_inner(self) -> Principal {
        self.0
    }
}

impl FromRequest for AuthenticatedPrincipal {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_from(req);
        let verifier = req
            .app_data::<web::Data<HttpState>>()
            .map(|state| state.identity.clone());
        Box::pin(async move {
            let token = token?;
            let verifier =
                verifier.ok_or_else(|| Error::internal("HttpState missing from app data"))?;
            verifier.verify(&token).await.map(Self).map_err(|err| {
                warn!(error = %err, kind = err.kind(), "identity token rejected");
                Error::forbidden(INVALID_TOKEN)
            })
        })
    }
}
