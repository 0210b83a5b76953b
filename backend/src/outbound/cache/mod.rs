//! In-process result cache.
//!
//! Entries live in a mutex-guarded map keyed by the namespaced discovery key.
//! Expiry is lazy on read, and [`InMemoryResultCache::sweep`] removes expired
//! entries and then trims the map to capacity, oldest insertion first. The
//! server runs the sweep on an interval.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use tracing::debug;

use crate::domain::ports::{DiscoveryCacheKey, ResultCache, ResultCacheError};

/// Default number of entries retained before eviction.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

#[derive(Debug)]
struct Entry {
    payload: String,
    expires_at: DateTime<Utc>,
    inserted: u64,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Default)]
struct Entries {
    by_key: HashMap<String, Entry>,
    next_seq: u64,
}

impl Entries {
    fn remove_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.by_key.len();
        self.by_key.retain(|_, entry| !entry.is_expired(now));
        before - self.by_key.len()
    }

    fn trim_to(&mut self, capacity: usize) -> usize {
        let mut evicted = 0;
        while self.by_key.len() > capacity {
            let oldest = self
                .by_key
                .iter()
                .min_by_key(|(_, entry)| entry.inserted)
                .map(|(key, _)| key.clone());
            let Some(key) = oldest else { break };
            self.by_key.remove(&key);
            evicted += 1;
        }
        evicted
    }
}

/// TTL and capacity bounded cache of serialised responses.
pub struct InMemoryResultCache {
    entries: Mutex<Entries>,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl InMemoryResultCache {
    /// Create an empty cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            capacity,
            clock,
        }
    }

    /// Number of stored entries, expired ones included until swept.
    ///
    /// # Errors
    /// Returns [`ResultCacheError::Backend`] when the lock is poisoned.
    pub fn len(&self) -> Result<usize, ResultCacheError> {
        Ok(self.lock()?.by_key.len())
    }

    /// Whether the cache holds no entries.
    ///
    /// # Errors
    /// Returns [`ResultCacheError::Backend`] when the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, ResultCacheError> {
        Ok(self.lock()?.by_key.is_empty())
    }

    /// Drop expired entries, then evict the oldest until within capacity.
    ///
    /// Returns the number of entries removed.
    ///
    /// # Errors
    /// Returns [`ResultCacheError::Backend`] when the lock is poisoned.
    pub fn sweep(&self) -> Result<usize, ResultCacheError> {
        let now = self.clock.utc();
        let mut entries = self.lock()?;
        let expired = entries.remove_expired(now);
        let evicted = entries.trim_to(self.capacity);
        if expired + evicted > 0 {
            debug!(expired, evicted, "result cache swept");
        }
        Ok(expired + evicted)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Entries>, ResultCacheError> {
        self.entries
            .lock()
            .map_err(|_| ResultCacheError::backend("result cache lock poisoned"))
    }
}

#[async_trait]
impl ResultCache for InMemoryResultCache {
    async fn get(&self, key: &DiscoveryCacheKey) -> Result<Option<String>, ResultCacheError> {
        let now = self.clock.utc();
        let mut entries = self.lock()?;
        let expired = entries
            .by_key
            .get(key.as_str())
            .is_some_and(|entry| entry.is_expired(now));
        if expired {
            entries.by_key.remove(key.as_str());
            return Ok(None);
        }
        Ok(entries
            .by_key
            .get(key.as_str())
            .map(|entry| entry.payload.clone()))
    }

    async fn put(
        &self,
        key: &DiscoveryCacheKey,
        payload: String,
        ttl: Duration,
    ) -> Result<(), ResultCacheError> {
        if ttl.is_zero() || self.capacity == 0 {
            return Ok(());
        }
        let now = self.clock.utc();
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut entries = self.lock()?;
        let inserted = entries.next_seq;
        entries.next_seq = inserted.saturating_add(1);
        entries.by_key.insert(
            key.as_str().to_owned(),
            Entry {
                payload,
                expires_at,
                inserted,
            },
        );
        if entries.by_key.len() > self.capacity {
            entries.remove_expired(now);
            entries.trim_to(self.capacity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MutableClock;
    use rstest::{fixture, rstest};

    fn key(name: &str) -> DiscoveryCacheKey {
        DiscoveryCacheKey::builder("feed").field("name", name).build()
    }

    #[fixture]
    fn clock() -> Arc<MutableClock> {
        Arc::new(MutableClock::default())
    }

    #[rstest]
    #[tokio::test]
    async fn returns_payload_within_ttl(clock: Arc<MutableClock>) {
        let cache = InMemoryResultCache::new(4, clock.clone());
        cache
            .put(&key("a"), "{\"items\":[]}".to_owned(), Duration::from_secs(30))
            .await
            .expect("put");

        clock.advance(Duration::from_secs(29));
        let hit = cache.get(&key("a")).await.expect("get");
        assert_eq!(hit.as_deref(), Some("{\"items\":[]}"));
    }

    #[rstest]
    #[tokio::test]
    async fn expired_entries_are_removed_on_read(clock: Arc<MutableClock>) {
        let cache = InMemoryResultCache::new(4, clock.clone());
        cache
            .put(&key("a"), "x".to_owned(), Duration::from_secs(30))
            .await
            .expect("put");

        clock.advance(Duration::from_secs(30));
        assert_eq!(cache.get(&key("a")).await.expect("get"), None);
        assert_eq!(cache.len().expect("len"), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn capacity_evicts_oldest_insertion(clock: Arc<MutableClock>) {
        let cache = InMemoryResultCache::new(2, clock.clone());
        for name in ["a", "b", "c"] {
            cache
                .put(&key(name), name.to_owned(), Duration::from_secs(60))
                .await
                .expect("put");
        }

        assert_eq!(cache.get(&key("a")).await.expect("get"), None);
        assert_eq!(cache.get(&key("b")).await.expect("get").as_deref(), Some("b"));
        assert_eq!(cache.get(&key("c")).await.expect("get").as_deref(), Some("c"));
    }

    #[rstest]
    #[tokio::test]
    async fn expired_entries_are_evicted_before_live_ones(clock: Arc<MutableClock>) {
        let cache = InMemoryResultCache::new(2, clock.clone());
        cache
            .put(&key("old-live"), "1".to_owned(), Duration::from_secs(600))
            .await
            .expect("put");
        cache
            .put(&key("short"), "2".to_owned(), Duration::from_secs(5))
            .await
            .expect("put");
        clock.advance(Duration::from_secs(10));
        cache
            .put(&key("new"), "3".to_owned(), Duration::from_secs(600))
            .await
            .expect("put");

        assert_eq!(
            cache.get(&key("old-live")).await.expect("get").as_deref(),
            Some("1")
        );
        assert_eq!(cache.len().expect("len"), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn sweep_drops_expired_entries(clock: Arc<MutableClock>) {
        let cache = InMemoryResultCache::new(8, clock.clone());
        cache
            .put(&key("short"), "1".to_owned(), Duration::from_secs(30))
            .await
            .expect("put");
        cache
            .put(&key("long"), "2".to_owned(), Duration::from_secs(300))
            .await
            .expect("put");

        clock.advance(Duration::from_secs(31));
        assert_eq!(cache.sweep().expect("sweep"), 1);
        assert_eq!(cache.len().expect("len"), 1);
    }

    #[rstest]
    #[case(Duration::ZERO, 4)]
    #[case(Duration::from_secs(30), 0)]
    #[tokio::test]
    async fn degenerate_settings_store_nothing(
        clock: Arc<MutableClock>,
        #[case] ttl: Duration,
        #[case] capacity: usize,
    ) {
        let cache = InMemoryResultCache::new(capacity, clock);
        cache.put(&key("a"), "x".to_owned(), ttl).await.expect("put");
        assert!(cache.is_empty().expect("is_empty"));
    }
}
