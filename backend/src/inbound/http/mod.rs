//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

pub mod auth;
pub mod cache_admin;
pub mod error;
pub mod health;
pub mod resources;
pub mod root;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;

pub use error::ApiResult;

/// Register every route and the 404 fallback.
///
/// Callers supply `web::Data<HttpState>` and `web::Data<HealthState>`.
///
/// # Examples
/// ```
/// use actix_web::App;
///
/// let _app = App::new().configure(backend::inbound::http::configure);
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(root::index)
        .service(health::health)
        .service(health::ready)
        .service(health::live)
        .service(
            web::scope("/api")
                .service(resources::user_data)
                .service(resources::user_profile)
                .service(cache_admin::flush_cache)
                .service(cache_admin::clear_user_cache),
        )
        .default_service(web::to(root::not_found));
}
