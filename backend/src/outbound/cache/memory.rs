//! Process-local cache store with expiry and glob matching.
//!
//! Useful for development without a Redis server and as a faithful stand-in
//! in integration tests. Expiry is evaluated lazily against the injected
//! clock, and patterns follow Redis glob rules (`*`, `?`, `[...]`, `[^...]`,
//! `\`). Redis negates a class with `^`; it is rewritten to the `!` form the
//! matcher understands. A class opening with `!` is therefore also negated
//! here, whereas Redis would treat the `!` literally.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use globset::GlobBuilder;
use mockable::Clock;

use crate::domain::ports::{CacheConnector, CacheKey, CachePattern, CacheStore, CacheStoreError};

struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-memory [`CacheStore`].
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use backend::domain::ports::{CacheKey, CacheStore};
/// use backend::outbound::cache::InMemoryCacheStore;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let store = InMemoryCacheStore::new(Arc::new(mockable::DefaultClock));
/// let key = CacheKey::new("user_data:u1").expect("key");
/// store.set(&key, "{}", Duration::from_secs(60)).await.expect("set");
/// assert_eq!(store.get(&key).await.expect("get"), Some("{}".to_owned()));
/// # });
/// ```
pub struct InMemoryCacheStore {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryCacheStore {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Number of unexpired entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = self.clock.utc();
        self.lock()
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    /// Whether no unexpired entries remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheStoreError> {
        let now = self.clock.utc();
        let mut entries = self.lock();
        match entries.get(key.as_str()) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key.as_str());
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &CacheKey, value: &str, ttl: Duration) -> Result<(), CacheStoreError> {
        let ttl = TimeDelta::from_std(ttl)
            .map_err(|err| CacheStoreError::command(format!("ttl out of range: {err}")))?;
        let expires_at = self.clock.utc() + ttl;
        self.lock().insert(
            key.as_str().to_owned(),
            Entry {
                value: value.to_owned(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<bool, CacheStoreError> {
        let now = self.clock.utc();
        Ok(self
            .lock()
            .remove(key.as_str())
            .is_some_and(|entry| entry.expires_at > now))
    }

    async fn flush_all(&self) -> Result<(), CacheStoreError> {
        self.lock().clear();
        Ok(())
    }

    async fn delete_matching(&self, pattern: &CachePattern) -> Result<u64, CacheStoreError> {
        let glob = to_globset_syntax(pattern.as_str());
        let matcher = GlobBuilder::new(&glob)
            .literal_separator(false)
            .backslash_escape(true)
            .build()
            .map_err(|err| CacheStoreError::command(format!("invalid pattern: {err}")))?
            .compile_matcher();
        let now = self.clock.utc();
        let mut removed: u64 = 0;
        self.lock().retain(|key, entry| {
            if matcher.is_match(key.as_str()) {
                if entry.expires_at > now {
                    removed = removed.saturating_add(1);
                }
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), CacheStoreError> {
        Ok(())
    }
}

fn to_globset_syntax(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        out.push(c);
        match c {
            '\\' => out.extend(chars.next()),
            '[' if chars.as_str().starts_with('^') => {
                chars.next();
                out.push('!');
            }
            _ => {}
        }
    }
    out
}

/// Connector handing out one shared [`InMemoryCacheStore`].
#[derive(Clone)]
pub struct InMemoryCacheConnector {
    store: Arc<InMemoryCacheStore>,
}

impl InMemoryCacheConnector {
    #[must_use]
    pub fn new(store: Arc<InMemoryCacheStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CacheConnector for InMemoryCacheConnector {
    async fn connect(&self) -> Result<Arc<dyn CacheStore>, CacheStoreError> {
        Ok(self.store.clone())
    }
}
