//! Domain primitives, the cache client, and the cache-aside service.
//!
//! Purpose: keep identity, cache keys, and the best-effort caching policy free
//! of transport and store details. Inbound adapters call the driving ports in
//! [`ports`]; outbound adapters implement the driven ones.
//!
//! Public surface:
//! - `Error` / `ErrorCode`: transport-agnostic failures.
//! - `Principal` / `UserId` / `BearerToken`: verified identity primitives.
//! - `CacheClient`: degraded-mode aware JSON cache client.
//! - `UserResourcesService`: cache-aside implementation of the driving ports.

pub mod auth;
pub mod cache_client;
pub mod error;
pub mod ports;
pub mod principal;
pub mod trace_id;
pub mod user_resources;
pub mod user_resources_service;

pub use self::auth::{BearerToken, BearerTokenError};
pub use self::cache_client::{
    CacheClient, CacheClientRuntime, CacheHealth, CacheHealthStatus, CachePhase, ReconnectPolicy,
    ReconnectSleeper, TokioSleeper,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::principal::{Principal, USER_ID_MAX_LEN, UserId, UserIdError};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user_resources::{
    Cached, ClearedUserCache, FlushOutcome, UserData, UserProfile, format_timestamp,
};
pub use self::user_resources_service::UserResourcesService;
