//! End-to-end cache-aside behaviour through the HTTP adapter.

#[path = "support/cache_app.rs"]
mod cache_app;

use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test as actix_test};
use backend::Trace;
use backend::inbound::http::configure;
use cache_app::{Backing, CacheApp, OTHER_TOKEN, OWNER_TOKEN};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

#[fixture]
async fn connected() -> CacheApp {
    let app = CacheApp::new(Backing::Memory);
    assert!(app.cache.connect().await, "in-memory store connects");
    app
}

async fn send(app: &CacheApp, req: actix_test::TestRequest) -> (StatusCode, Value) {
    let service = actix_test::init_service(
        App::new()
            .app_data(app.state.clone())
            .wrap(Trace)
            .configure(configure),
    )
    .await;
    let res = actix_test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = actix_test::read_body(res).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("json body")
    };
    (status, value)
}

fn authed(req: actix_test::TestRequest, token: &str) -> actix_test::TestRequest {
    req.insert_header((AUTHORIZATION, format!("Bearer {token}")))
}

async fn get_as(app: &CacheApp, path: &str, token: &str) -> Value {
    let (status, body) = send(app, authed(actix_test::TestRequest::get().uri(path), token)).await;
    assert_eq!(status, StatusCode::OK, "GET {path}: {body}");
    body
}

#[rstest]
#[actix_web::test]
async fn second_data_read_is_served_from_cache(#[future] connected: CacheApp) {
    let app = connected.await;

    let first = get_as(&app, "/api/data", OWNER_TOKEN).await;
    assert_eq!(first["cached"], json!(false));
    assert_eq!(first["userId"], json!("u1"));
    assert_eq!(first["userEmail"], json!("u1@example.com"));
    assert_eq!(first["timestamp"], json!("2026-04-02T12:00:00.000Z"));

    app.clock.advance_secs(5);
    let second = get_as(&app, "/api/data", OWNER_TOKEN).await;
    assert_eq!(second["cached"], json!(true));
    assert_eq!(second["timestamp"], first["timestamp"]);
}

#[rstest]
#[actix_web::test]
async fn cached_data_expires_after_its_ttl(#[future] connected: CacheApp) {
    let app = connected.await;
    get_as(&app, "/api/data", OWNER_TOKEN).await;

    app.clock.advance_secs(300);
    let refreshed = get_as(&app, "/api/data", OWNER_TOKEN).await;
    assert_eq!(refreshed["cached"], json!(false));
    assert_eq!(refreshed["timestamp"], json!("2026-04-02T12:05:00.000Z"));
}

#[rstest]
#[actix_web::test]
async fn profile_is_cached_and_fills_placeholders(#[future] connected: CacheApp) {
    let app = connected.await;

    let first = get_as(&app, "/api/profile", OTHER_TOKEN).await;
    assert_eq!(
        first,
        json!({
            "uid": "u2",
            "email": "u2@example.com",
            "emailVerified": true,
            "name": "Not provided",
            "picture": null,
            "cached": false
        })
    );
    let second = get_as(&app, "/api/profile", OTHER_TOKEN).await;
    assert_eq!(second["cached"], json!(true));
}

#[rstest]
#[actix_web::test]
async fn users_never_see_each_others_entries(#[future] connected: CacheApp) {
    let app = connected.await;
    get_as(&app, "/api/data", OWNER_TOKEN).await;

    let other = get_as(&app, "/api/data", OTHER_TOKEN).await;
    assert_eq!(other["cached"], json!(false));
    assert_eq!(other["userId"], json!("u2"));
}

#[rstest]
#[actix_web::test]
async fn clearing_own_cache_forces_recompute(#[future] connected: CacheApp) {
    let app = connected.await;
    get_as(&app, "/api/data", OWNER_TOKEN).await;
    get_as(&app, "/api/profile", OWNER_TOKEN).await;

    let (status, body) = send(
        &app,
        authed(actix_test::TestRequest::delete().uri("/api/cache/user/u1"), OWNER_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "message": "Cache cleared for user: u1",
            "clearedKeys": ["user_data:u1", "user_profile:u1"]
        })
    );

    assert_eq!(get_as(&app, "/api/data", OWNER_TOKEN).await["cached"], json!(false));
    assert_eq!(get_as(&app, "/api/profile", OWNER_TOKEN).await["cached"], json!(false));
}

#[rstest]
#[actix_web::test]
async fn clearing_another_users_cache_is_forbidden(#[future] connected: CacheApp) {
    let app = connected.await;
    get_as(&app, "/api/data", OTHER_TOKEN).await;

    let (status, body) = send(
        &app,
        authed(actix_test::TestRequest::delete().uri("/api/cache/user/u2"), OWNER_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "Cannot clear cache for another user" }));
    assert_eq!(get_as(&app, "/api/data", OTHER_TOKEN).await["cached"], json!(true));
}

#[rstest]
#[actix_web::test]
async fn pattern_flush_only_touches_matching_keys(#[future] connected: CacheApp) {
    let app = connected.await;
    get_as(&app, "/api/data", OWNER_TOKEN).await;
    get_as(&app, "/api/profile", OWNER_TOKEN).await;

    let (status, body) = send(
        &app,
        authed(actix_test::TestRequest::post().uri("/api/cache/flush"), OWNER_TOKEN)
            .set_json(json!({ "pattern": "user_data:*" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "message": "Cache flushed successfully for pattern: user_data:*",
            "pattern": "user_data:*"
        })
    );

    assert_eq!(get_as(&app, "/api/data", OWNER_TOKEN).await["cached"], json!(false));
    assert_eq!(get_as(&app, "/api/profile", OWNER_TOKEN).await["cached"], json!(true));
}

#[rstest]
#[actix_web::test]
async fn bodiless_flush_clears_everything(#[future] connected: CacheApp) {
    let app = connected.await;
    get_as(&app, "/api/data", OWNER_TOKEN).await;
    get_as(&app, "/api/profile", OTHER_TOKEN).await;

    let (status, body) = send(
        &app,
        authed(actix_test::TestRequest::post().uri("/api/cache/flush"), OTHER_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "message": "Cache flushed successfully", "pattern": "*" })
    );

    assert_eq!(get_as(&app, "/api/data", OWNER_TOKEN).await["cached"], json!(false));
    assert_eq!(get_as(&app, "/api/profile", OTHER_TOKEN).await["cached"], json!(false));
}

#[rstest]
#[actix_web::test]
async fn malformed_flush_body_is_rejected(#[future] connected: CacheApp) {
    let app = connected.await;
    let (status, body) = send(
        &app,
        authed(actix_test::TestRequest::post().uri("/api/cache/flush"), OWNER_TOKEN)
            .insert_header(("content-type", "application/json"))
            .set_payload("{oops"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .is_some_and(|msg| msg.starts_with("Invalid JSON body")),
        "unexpected body: {body}"
    );
}

#[actix_web::test]
async fn reads_degrade_to_uncached_without_a_store() {
    let app = CacheApp::new(Backing::Unavailable);
    assert!(!app.cache.connect().await);

    for _ in 0..2 {
        let body = get_as(&app, "/api/data", OWNER_TOKEN).await;
        assert_eq!(body["cached"], json!(false));
    }
    let profile = get_as(&app, "/api/profile", OWNER_TOKEN).await;
    assert_eq!(profile["name"], json!("Ada"));
    assert_eq!(profile["cached"], json!(false));
}

#[actix_web::test]
async fn flush_fails_without_a_store() {
    let app = CacheApp::new(Backing::Unavailable);
    let (status, body) = send(
        &app,
        authed(actix_test::TestRequest::post().uri("/api/cache/flush"), OWNER_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to flush cache" }));
}

#[actix_web::test]
async fn clearing_own_cache_succeeds_without_a_store() {
    let app = CacheApp::new(Backing::Unavailable);
    let (status, body) = send(
        &app,
        authed(actix_test::TestRequest::delete().uri("/api/cache/user/u1"), OWNER_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Cache cleared for user: u1"));
}

#[rstest]
#[case::missing_header(None, StatusCode::UNAUTHORIZED, "Access token required")]
#[case::wrong_scheme(Some("Basic dTE6cHc="), StatusCode::UNAUTHORIZED, "Access token required")]
#[case::unknown_token(Some("Bearer forged"), StatusCode::FORBIDDEN, "Invalid token")]
#[actix_web::test]
async fn protected_routes_reject_bad_credentials(
    #[case] header: Option<&str>,
    #[case] expected: StatusCode,
    #[case] message: &str,
) {
    let app = CacheApp::new(Backing::Memory);
    for (method, path) in [
        ("GET", "/api/data"),
        ("GET", "/api/profile"),
        ("POST", "/api/cache/flush"),
        ("DELETE", "/api/cache/user/u1"),
    ] {
        let mut req = match method {
            "GET" => actix_test::TestRequest::get(),
            "POST" => actix_test::TestRequest::post(),
            _ => actix_test::TestRequest::delete(),
        }
        .uri(path);
        if let Some(value) = header {
            req = req.insert_header((AUTHORIZATION, value));
        }
        let (status, body) = send(&app, req).await;
        assert_eq!(status, expected, "{method} {path}");
        assert_eq!(body, json!({ "error": message }), "{method} {path}");
    }
}

#[actix_web::test]
async fn unknown_routes_return_not_found() {
    let app = CacheApp::new(Backing::Memory);
    let (status, body) = send(&app, actix_test::TestRequest::get().uri("/api/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Endpoint not found" }));
}

#[rstest]
#[case::connected(Backing::Memory, true, "healthy")]
#[case::without_store(Backing::Unavailable, false, "disconnected")]
#[actix_web::test]
async fn health_reports_cache_status(
    #[case] backing: Backing,
    #[case] connects: bool,
    #[case] expected: &str,
) {
    let app = CacheApp::new(backing);
    assert_eq!(app.cache.connect().await, connects);

    let (status, body) = send(&app, actix_test::TestRequest::get().uri("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("OK"));
    assert_eq!(body["service"], json!("backend-api"));
    assert_eq!(body["timestamp"], json!("2026-04-02T12:00:00.000Z"));
    assert_eq!(body["redis"]["status"], json!(expected));
}

#[actix_web::test]
async fn root_is_public() {
    let app = CacheApp::new(Backing::Unavailable);
    let (status, body) = send(&app, actix_test::TestRequest::get().uri("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Backend API is running!"));
}
