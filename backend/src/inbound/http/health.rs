//! Health endpoints: the service status report plus liveness and readiness
//! probes for orchestration and load balancers.

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};

use super::schemas::HealthResponse;
use super::state::HttpState;
use crate::domain::format_timestamp;

/// Service name reported by `GET /health`.
pub const SERVICE_NAME: &str = "backend-api";

/// Shared health state for readiness and liveness checks.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
        }
    }
}

impl HealthState {
    /// Create a new health state starting as not ready but live.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the service as ready.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Flag the service as unhealthy so liveness checks fail fast during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn probe_response(probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// Service status including the cache store's health.
///
/// Always 200: a degraded cache does not make the API unhealthy.
#[utoipa::path(
    get,
    path = "/health",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Service status", body = HealthResponse)
    )
)]
#[get("/health")]
pub async fn health(state: web::Data<HttpState>) -> web::Json<HealthResponse> {
    let redis = state.cache_health.cache_health().await;
    web::Json(HealthResponse {
        status: "OK".to_owned(),
        timestamp: format_timestamp(state.clock.utc()),
        service: SERVICE_NAME.to_owned(),
        redis,
    })
}

/// Readiness probe. Return 200 once the server is initialised and 503 otherwise.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is not ready")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_ready())
}

/// Liveness probe. Return 200 while the process is marked alive and 503 once draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_alive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{FixtureIdentityVerifier, MockCacheHealthQuery};
    use crate::domain::{CacheHealth, CacheHealthStatus};
    use crate::inbound::http::test_utils::ports_with_identity;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::Value;
    use std::sync::Arc;

    #[rstest]
    #[case(false, true, StatusCode::SERVICE_UNAVAILABLE, StatusCode::OK)]
    #[case(true, true, StatusCode::OK, StatusCode::OK)]
    #[case(true, false, StatusCode::OK, StatusCode::SERVICE_UNAVAILABLE)]
    #[actix_web::test]
    async fn probes_follow_health_state(
        #[case] ready_flag: bool,
        #[case] live_flag: bool,
        #[case] ready_status: StatusCode,
        #[case] live_status: StatusCode,
    ) {
        let state = web::Data::new(HealthState::new());
        if ready_flag {
            state.mark_ready();
        }
        if !live_flag {
            state.mark_unhealthy();
        }
        let app =
            actix_test::init_service(App::new().app_data(state).service(ready).service(live)).await;

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/health/ready").to_request()).await;
        assert_eq!(res.status(), ready_status);
        assert_eq!(
            res.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/health/live").to_request()).await;
        assert_eq!(res.status(), live_status);
    }

    #[actix_web::test]
    async fn health_reports_cache_state() {
        let mut cache_health = MockCacheHealthQuery::new();
        cache_health.expect_cache_health().times(1).returning(|| {
            CacheHealth::new(CacheHealthStatus::Disconnected, "Cache store not connected")
        });
        let mut ports = ports_with_identity(FixtureIdentityVerifier::default());
        ports.cache_health = Arc::new(cache_health);
        let state = web::Data::new(HttpState::new(ports));
        let app = actix_test::init_service(App::new().app_data(state).service(health)).await;

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["status"], "OK");
        assert_eq!(body["service"], SERVICE_NAME);
        assert_eq!(body["timestamp"], "2026-04-02T12:00:00.000Z");
        assert_eq!(body["redis"]["status"], "disconnected");
        assert_eq!(body["redis"]["message"], "Cache store not connected");
    }
}
