//! Shared wiring for integration suites driving the full HTTP surface over
//! the in-memory cache store.

use std::sync::{Arc, Mutex, PoisonError};

use actix_web::web;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use backend::domain::ports::{
    CacheConnector, FixtureIdentityVerifier, UnavailableCacheConnector,
};
use backend::domain::{CacheClient, Principal, UserId, UserResourcesService};
use backend::inbound::http::state::{HttpState, HttpStatePorts};
use backend::outbound::cache::{InMemoryCacheConnector, InMemoryCacheStore};

/// Token accepted as user `u1`.
pub(crate) const OWNER_TOKEN: &str = "token-u1";
/// Token accepted as user `u2`.
pub(crate) const OTHER_TOKEN: &str = "token-u2";

/// Clock that only moves when told to.
pub(crate) struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub(crate) fn starting_at(at: DateTime<Utc>) -> Self {
        Self(Mutex::new(at))
    }

    pub(crate) fn advance_secs(&self, secs: i64) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) += TimeDelta::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Which cache store backs the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Backing {
    Memory,
    Unavailable,
}

/// Application state plus handles for steering it from tests.
pub(crate) struct CacheApp {
    pub(crate) state: web::Data<HttpState>,
    pub(crate) cache: Arc<CacheClient>,
    pub(crate) clock: Arc<ManualClock>,
}

fn fixture_principal(id: &str, name: Option<&str>) -> Principal {
    let principal = Principal::new(UserId::new(id).expect("fixture user id"))
        .with_email(format!("{id}@example.com"), true);
    match name {
        Some(name) => principal.with_display_name(name),
        None => principal,
    }
}

impl CacheApp {
    /// Build the application; the cache client is not yet connected.
    pub(crate) fn new(backing: Backing) -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 4, 2, 12, 0, 0)
            .single()
            .expect("valid start instant");
        let clock = Arc::new(ManualClock::starting_at(start));
        let connector: Arc<dyn CacheConnector> = match backing {
            Backing::Memory => Arc::new(InMemoryCacheConnector::new(Arc::new(
                InMemoryCacheStore::new(clock.clone()),
            ))),
            Backing::Unavailable => Arc::new(UnavailableCacheConnector),
        };
        let cache = Arc::new(CacheClient::new(connector));
        let service = Arc::new(UserResourcesService::new(cache.clone(), clock.clone()));
        let identity = FixtureIdentityVerifier::default()
            .with_token(OWNER_TOKEN, fixture_principal("u1", Some("Ada")))
            .with_token(OTHER_TOKEN, fixture_principal("u2", None));

        let state = web::Data::new(HttpState::new(HttpStatePorts {
            identity: Arc::new(identity),
            resources: service.clone(),
            cache_admin: service,
            cache_health: cache.clone(),
            clock: clock.clone(),
        }));
        Self {
            state,
            cache,
            clock,
        }
    }
}
