//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod cache_key;
mod cache_store;
mod identity_verifier;
mod user_resources;

pub use cache_key::{CacheKey, CacheKeyValidationError, CacheNamespace, CachePattern};
#[cfg(test)]
pub use cache_store::{MockCacheConnector, MockCacheStore};
pub use cache_store::{CacheConnector, CacheStore, CacheStoreError, UnavailableCacheConnector};
#[cfg(test)]
pub use identity_verifier::MockIdentityVerifier;
pub use identity_verifier::{
    FixtureIdentityVerifier, IdentityVerifier, IdentityVerifierError,
    UnconfiguredIdentityVerifier,
};
#[cfg(test)]
pub use user_resources::{MockCacheAdminCommand, MockCacheHealthQuery, MockUserResourcesQuery};
pub use user_resources::{CacheAdminCommand, CacheHealthQuery, UserResourcesQuery};
