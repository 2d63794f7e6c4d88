//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint, the request and response bodies
//! from [`crate::inbound::http::schemas`], and the bearer token security
//! scheme. Swagger UI serves it in debug builds.

use crate::inbound::http::schemas::{
    CacheHealthSchema, ClearUserCacheResponse, ErrorBody, FlushRequest, FlushResponse,
    HealthResponse, RootResponse, UserDataSchema, UserProfileSchema,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Firebase ID token"))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Cacheside backend API",
        description = "Authenticated per-user resources with a best-effort Redis cache."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::root::index,
        crate::inbound::http::health::health,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
        crate::inbound::http::resources::user_data,
        crate::inbound::http::resources::user_profile,
        crate::inbound::http::cache_admin::flush_cache,
        crate::inbound::http::cache_admin::clear_user_cache,
    ),
    components(schemas(
        ErrorBody,
        RootResponse,
        HealthResponse,
        CacheHealthSchema,
        UserDataSchema,
        UserProfileSchema,
        FlushRequest,
        FlushResponse,
        ClearUserCacheResponse,
    )),
    tags(
        (name = "resources", description = "Cached per-user resources"),
        (name = "cache", description = "Cache administration"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
