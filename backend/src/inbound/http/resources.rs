//! Authenticated per-user resources served through the cache-aside service.
//!
//! ```text
//! GET /api/data
//! GET /api/profile
//! ```

use actix_web::{get, web};

use super::ApiResult;
use super::auth::AuthenticatedPrincipal;
use super::schemas::{CachedPayload, ErrorBody, UserDataSchema, UserProfileSchema};
use super::state::HttpState;
use crate::domain::{UserData, UserProfile};

/// Greeting payload for the caller, tagged with whether it came from cache.
#[utoipa::path(
    get,
    path = "/api/data",
    tags = ["resources"],
    responses(
        (status = 200, description = "Caller's data payload", body = UserDataSchema),
        (status = 401, description = "Access token required", body = ErrorBody),
        (status = 403, description = "Invalid token", body = ErrorBody)
    ),
    security(("BearerAuth" = []))
)]
#[get("/data")]
pub async fn user_data(
    state: web::Data<HttpState>,
    principal: AuthenticatedPrincipal,
) -> ApiResult<web::Json<CachedPayload<UserData>>> {
    let payload = state.resources.user_data(&principal.0).await?;
    Ok(web::Json(payload.into()))
}

/// Profile payload for the caller, tagged with whether it came from cache.
#[utoipa::path(
    get,
    path = "/api/profile",
    tags = ["resources"],
    responses(
        (status = 200, description = "Caller's profile", body = UserProfileSchema),
        (status = 401, description = "Access token required", body = ErrorBody),
        (status = 403, description = "Invalid token", body = ErrorBody)
    ),
    security(("BearerAuth" = []))
)]
#[get("/profile")]
pub async fn user_profile(
    state: web::Data<HttpState>,
    principal: AuthenticatedPrincipal,
) -> ApiResult<web::Json<CachedPayload<UserProfile>>> {
    let payload = state.resources.user_profile(&principal.0).await?;
    Ok(web::Json(payload.into()))
}
