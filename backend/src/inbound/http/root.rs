//! Public landing endpoint and the catch-all 404.

use actix_web::{HttpResponse, get, web};

use super::ApiResult;
use super::schemas::RootResponse;
use super::state::HttpState;
use crate::domain::{Error, format_timestamp};

/// Confirm the API is up. No authentication required.
#[utoipa::path(
    get,
    path = "/",
    tags = ["health"],
    security([]),
    responses((status = 200, description = "API is running", body = RootResponse))
)]
#[get("/")]
pub async fn index(state: web::Data<HttpState>) -> web::Json<RootResponse> {
    web::Json(RootResponse {
        message: "Backend API is running!".to_owned(),
        timestamp: format_timestamp(state.clock.utc()),
    })
}

/// Default service for unmatched routes.
pub async fn not_found() -> ApiResult<HttpResponse> {
    Err(Error::not_found("Endpoint not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::FixtureIdentityVerifier;
    use crate::inbound::http::test_utils::state_with_identity;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn index_reports_running() {
        let app = actix_test::init_service(
            App::new()
                .app_data(state_with_identity(FixtureIdentityVerifier::default()))
                .service(index),
        )
        .await;
        let body: Value =
            actix_test::call_and_read_body_json(&app, actix_test::TestRequest::get().uri("/").to_request())
                .await;
        assert_eq!(
            body,
            json!({"message": "Backend API is running!", "timestamp": "2026-04-02T12:00:00.000Z"})
        );
    }

    #[actix_web::test]
    async fn unmatched_routes_are_404() {
        let app =
            actix_test::init_service(App::new().default_service(web::to(not_found))).await;
        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/nope").to_request()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body, json!({"error": "Endpoint not found"}));
    }
}
