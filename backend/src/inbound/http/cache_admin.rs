//! Cache administration endpoints.
//!
//! ```text
//! POST   /api/cache/flush            {"pattern": "user_data:*"}
//! DELETE /api/cache/user/{userId}
//! ```

use actix_web::{delete, post, web};

use super::ApiResult;
use super::auth::AuthenticatedPrincipal;
use super::schemas::{ClearUserCacheResponse, ErrorBody, FlushRequest, FlushResponse};
use super::state::HttpState;
use crate::domain::ports::CachePattern;
use crate::domain::{Error, FlushOutcome, UserId};

const FLUSH_SUCCESS: &str = "Cache flushed successfully";

fn parse_flush_request(body: &[u8]) -> ApiResult<Option<CachePattern>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let request: FlushRequest = serde_json::from_slice(body)
        .map_err(|err| Error::invalid_request(format!("Invalid JSON body: {err}")))?;
    request
        .pattern
        .filter(|pattern| !pattern.is_empty())
        .map(|pattern| {
            CachePattern::new(pattern)
                .map_err(|err| Error::invalid_request(format!("Invalid pattern: {err}")))
        })
        .transpose()
}

fn flush_message(outcome: &FlushOutcome) -> String {
    if outcome.explicit {
        format!("{FLUSH_SUCCESS} for pattern: {}", outcome.pattern)
    } else {
        FLUSH_SUCCESS.to_owned()
    }
}

/// Remove cached entries matching a glob pattern, or everything.
///
/// The body is optional; an empty body or empty `pattern` flushes all keys.
/// Body read failures, including an oversized payload, are reported as
/// `invalid_request` in the usual error envelope.
#[utoipa::path(
    post,
    path = "/api/cache/flush",
    tags = ["cache"],
    request_body(content = FlushRequest, description = "Optional pattern", content_type = "application/json"),
    responses(
        (status = 200, description = "Cache flushed", body = FlushResponse),
        (status = 400, description = "Malformed body", body = ErrorBody),
        (status = 401, description = "Access token required", body = ErrorBody),
        (status = 403, description = "Invalid token", body = ErrorBody),
        (status = 500, description = "Failed to flush cache", body = ErrorBody)
    ),
    security(("BearerAuth" = []))
)]
#[post("/cache/flush")]
pub async fn flush_cache(
    state: web::Data<HttpState>,
    principal: AuthenticatedPrincipal,
    body: Result<web::Bytes, actix_web::Error>,
) -> ApiResult<web::Json<FlushResponse>> {
    let body = body.map_err(|err| Error::invalid_request(format!("Invalid request body: {err}")))?;
    let pattern = parse_flush_request(&body)?;
    let outcome = state.cache_admin.flush(&principal.0, pattern).await?;
    Ok(web::Json(FlushResponse {
        message: flush_message(&outcome),
        pattern: outcome.pattern.to_string(),
    }))
}

/// Remove the caller's own per-user cache entries.
#[utoipa::path(
    delete,
    path = "/api/cache/user/{user_id}",
    tags = ["cache"],
    params(("user_id" = String, Path, description = "Must equal the caller's id")),
    responses(
        (status = 200, description = "User cache cleared", body = ClearUserCacheResponse),
        (status = 400, description = "Malformed user id", body = ErrorBody),
        (status = 401, description = "Access token required", body = ErrorBody),
        (status = 403, description = "Invalid token or another user's id", body = ErrorBody)
    ),
    security(("BearerAuth" = []))
)]
#[delete("/cache/user/{user_id}")]
pub async fn clear_user_cache(
    state: web::Data<HttpState>,
    principal: AuthenticatedPrincipal,
    path: web::Path<String>,
) -> ApiResult<web::Json<ClearUserCacheResponse>> {
    let target = UserId::new(path.into_inner())
        .map_err(|err| Error::invalid_request(format!("Invalid user id: {err}")))?;
    let cleared = state.cache_admin.clear_user(&principal.0, &target).await?;
    Ok(web::Json(ClearUserCacheResponse {
        message: format!("Cache cleared for user: {target}"),
        cleared_keys: cleared.keys.iter().map(ToString::to_string).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{FixtureIdentityVerifier, MockCacheAdminCommand};
    use crate::domain::ports::{CacheKey, CacheNamespace};
    use crate::domain::{ClearedUserCache, ErrorCode};
    use crate::inbound::http::test_utils::{ports_with_identity, principal};
    use actix_web::http::StatusCode;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::{Value, json};
    use std::sync::Arc;

    #[rstest]
    #[case(b"".as_slice(), None)]
    #[case(b"  \n".as_slice(), None)]
    #[case(b"{}".as_slice(), None)]
    #[case(br#"{"pattern":""}"#.as_slice(), None)]
    #[case(br#"{"pattern":null}"#.as_slice(), None)]
    #[case(br#"{"pattern":"user_data:*"}"#.as_slice(), Some("user_data:*"))]
    fn flush_body_defaults_to_everything(#[case] body: &[u8], #[case] expected: Option<&str>) {
        let parsed = parse_flush_request(body).expect("valid body");
        assert_eq!(parsed.as_ref().map(CachePattern::as_str), expected);
    }

    #[rstest]
    #[case(b"{not json".as_slice())]
    #[case(br#"{"pattern":"has space"}"#.as_slice())]
    #[case(br#"{"pattern":"user_data:\u0001*"}"#.as_slice())]
    fn malformed_flush_bodies_are_invalid(#[case] body: &[u8]) {
        let err = parse_flush_request(body).expect_err("invalid body");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    async fn call(admin: MockCacheAdminCommand, req: actix_test::TestRequest) -> (StatusCode, Value) {
        let identity = FixtureIdentityVerifier::default().with_token("t-u1", principal("u1"));
        let mut ports = ports_with_identity(identity);
        ports.cache_admin = Arc::new(admin);
        let app = actix_test::init_service(
            App::new().app_data(web::Data::new(HttpState::new(ports))).service(
                web::scope("/api")
                    .service(flush_cache)
                    .service(clear_user_cache),
            ),
        )
        .await;
        let res = actix_test::call_service(
            &app,
            req.insert_header((AUTHORIZATION, "Bearer t-u1")).to_request(),
        )
        .await;
        let status = res.status();
        (status, actix_test::read_body_json(res).await)
    }

    #[actix_web::test]
    async fn explicit_pattern_is_echoed() {
        let mut admin = MockCacheAdminCommand::new();
        admin
            .expect_flush()
            .withf(|_, pattern| pattern.as_ref().map(CachePattern::as_str) == Some("user_data:*"))
            .times(1)
            .returning(|_, pattern| {
                Ok(FlushOutcome {
                    pattern: pattern.expect("pattern"),
                    explicit: true,
                })
            });
        let req = actix_test::TestRequest::post()
            .uri("/api/cache/flush")
            .set_json(json!({"pattern": "user_data:*"}));

        let (status, body) = call(admin, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "message": "Cache flushed successfully for pattern: user_data:*",
                "pattern": "user_data:*"
            })
        );
    }

    #[actix_web::test]
    async fn empty_body_flushes_everything() {
        let mut admin = MockCacheAdminCommand::new();
        admin
            .expect_flush()
            .withf(|_, pattern| pattern.is_none())
            .returning(|_, _| {
                Ok(FlushOutcome {
                    pattern: CachePattern::all(),
                    explicit: false,
                })
            });
        let req = actix_test::TestRequest::post().uri("/api/cache/flush");

        let (status, body) = call(admin, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Cache flushed successfully", "pattern": "*"}));
    }

    #[actix_web::test]
    async fn failed_flush_is_500() {
        let mut admin = MockCacheAdminCommand::new();
        admin
            .expect_flush()
            .returning(|_, _| Err(Error::operation_failed("Failed to flush cache")));
        let req = actix_test::TestRequest::post().uri("/api/cache/flush");

        let (status, body) = call(admin, req).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to flush cache"}));
    }

    #[actix_web::test]
    async fn malformed_json_is_400_and_skips_the_service() {
        let mut admin = MockCacheAdminCommand::new();
        admin.expect_flush().never();
        let req = actix_test::TestRequest::post()
            .uri("/api/cache/flush")
            .insert_header(("content-type", "application/json"))
            .set_payload("{oops");

        let (status, body) = call(admin, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some_and(|m| m.starts_with("Invalid JSON body")));
    }

    #[actix_web::test]
    async fn oversized_body_uses_the_error_envelope() {
        let mut admin = MockCacheAdminCommand::new();
        admin.expect_flush().never();
        let req = actix_test::TestRequest::post()
            .uri("/api/cache/flush")
            .insert_header(("content-type", "application/json"))
            .set_payload(vec![b' '; 300 * 1024]);

        let (status, body) = call(admin, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["error"]
                .as_str()
                .is_some_and(|m| m.starts_with("Invalid request body")),
            "unexpected body: {body}"
        );
    }

    #[actix_web::test]
    async fn clearing_own_cache_lists_keys() {
        let mut admin = MockCacheAdminCommand::new();
        admin
            .expect_clear_user()
            .withf(|p, target| p.id() == target)
            .times(1)
            .returning(|_, target| {
                Ok(ClearedUserCache {
                    keys: CacheNamespace::ALL
                        .iter()
                        .map(|ns| CacheKey::for_user(*ns, target))
                        .collect(),
                })
            });
        let req = actix_test::TestRequest::delete().uri("/api/cache/user/u1");

        let (status, body) = call(admin, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "message": "Cache cleared for user: u1",
                "clearedKeys": ["user_data:u1", "user_profile:u1"]
            })
        );
    }

    #[actix_web::test]
    async fn clearing_another_users_cache_is_forbidden() {
        let mut admin = MockCacheAdminCommand::new();
        admin
            .expect_clear_user()
            .returning(|_, _| Err(Error::forbidden("Cannot clear cache for another user")));
        let req = actix_test::TestRequest::delete().uri("/api/cache/user/u2");

        let (status, body) = call(admin, req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"error": "Cannot clear cache for another user"}));
    }
}
