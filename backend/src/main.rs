//! Backend entry-point: loads settings, wires the cache client and identity
//! verifier, and serves the REST API.

mod server;

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use color_eyre::eyre::{Context, Result};
use mockable::DefaultEnv;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::domain::{CacheClient, CacheHealthStatus, CachePhase};
use backend::inbound::http::health::HealthState;
use backend::settings::AppSettings;
use server::{AppComponents, ServerConfig, build_components, create_server};

/// Interval between background cache health checks.
const CACHE_PROBE_INTERVAL: Duration = Duration::from_secs(30);

/// Connect the cache, then keep probing it so a lost or never-established
/// connection is retried without blocking requests.
async fn maintain_cache(cache: Arc<CacheClient>) {
    if !cache.connect().await {
        warn!("cache store unavailable; serving without cache");
    }
    let mut ticker = tokio::time::interval(CACHE_PROBE_INTERVAL);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        match cache.phase() {
            CachePhase::Disconnected => break,
            CachePhase::Connecting => continue,
            CachePhase::Ready | CachePhase::Degraded => {}
        }
        let health = cache.health().await;
        if health.status == CacheHealthStatus::Disconnected && cache.phase() == CachePhase::Degraded {
            info!("retrying cache store connection");
            cache.connect().await;
        }
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::from_env(&DefaultEnv::new()).wrap_err("invalid settings")?;
    let AppComponents { cache, http_state } = build_components(&settings);

    let maintenance = actix_web::rt::spawn(maintain_cache(Arc::clone(&cache)));

    let health_state = web::Data::new(HealthState::new());
    let config = ServerConfig::from(&settings);
    let addr = config.bind_addr();
    let server = create_server(health_state.clone(), http_state, config)
        .wrap_err_with(|| format!("failed to bind {addr}"))?;
    info!(%addr, "server listening");

    let outcome = server.await;

    health_state.mark_unhealthy();
    cache.disconnect();
    maintenance.abort();
    info!("server stopped");
    outcome.wrap_err("server terminated with an error")
}
