//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::web;
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use super::state::{HttpState, HttpStatePorts};
use crate::domain::ports::{
    IdentityVerifier, MockCacheAdminCommand, MockCacheHealthQuery, MockUserResourcesQuery,
};
use crate::domain::{Principal, UserId};

/// Clock pinned to 2026-04-02T12:00:00Z.
pub struct FixedClock;

impl FixedClock {
    pub fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, 12, 0, 0)
            .single()
            .expect("valid fixed instant")
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        Self::instant().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        Self::instant()
    }
}

/// Principal with `id` and a verified email.
pub fn principal(id: &str) -> Principal {
    Principal::new(UserId::new(id).expect("valid user id"))
        .with_email(format!("{id}@example.com"), true)
}

/// Ports where every driving port is a mock with no expectations.
pub fn ports_with_identity(identity: impl IdentityVerifier + 'static) -> HttpStatePorts {
    HttpStatePorts {
        identity: Arc::new(identity),
        resources: Arc::new(MockUserResourcesQuery::new()),
        cache_admin: Arc::new(MockCacheAdminCommand::new()),
        cache_health: Arc::new(MockCacheHealthQuery::new()),
        clock: Arc::new(FixedClock),
    }
}

/// Application state wrapping [`ports_with_identity`].
pub fn state_with_identity(identity: impl IdentityVerifier + 'static) -> web::Data<HttpState> {
    web::Data::new(HttpState::new(ports_with_identity(identity)))
}
