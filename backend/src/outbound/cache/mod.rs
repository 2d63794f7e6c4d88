//! Cache store adapters implementing the `CacheStore` and `CacheConnector`
//! ports.
//!
//! - [`RedisCacheConnector`] / [`RedisCacheStore`]: production store over a
//!   `bb8` pool of multiplexed Redis connections.
//! - [`InMemoryCacheConnector`] / [`InMemoryCacheStore`]: process-local store
//!   with the same expiry and glob semantics, for development and tests.

mod memory;
mod redis_store;

pub use memory::{InMemoryCacheConnector, InMemoryCacheStore};
pub use redis_store::{RedisCacheConnector, RedisCacheStore, RedisPoolConfig};
