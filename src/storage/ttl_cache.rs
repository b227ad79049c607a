//! Bounded, time-limited in-process cache
//!
//! Entries are never served at or after their expiry instant. Capacity is
//! bounded with LRU eviction. Reads hand out clones, so callers never share
//! a value with another request.

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clock::SharedClock;

/// Cached value with its expiry instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<T> {
    pub value: T,
    pub expires_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// LRU cache whose entries expire after a fixed TTL
pub struct TtlCache<T: Clone> {
    entries: Arc<RwLock<LruCache<String, CacheEntry<T>>>>,
    ttl: Duration,
    clock: SharedClock,
}

impl<T: Clone> TtlCache<T> {
    /// Create a cache holding at most `capacity` entries (minimum one)
    pub fn new(capacity: usize, ttl: std::time::Duration, clock: SharedClock) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(RwLock::new(LruCache::new(capacity))),
            ttl: Duration::from_std(ttl).unwrap_or(Duration::MAX),
            clock,
        }
    }

    /// Fresh copy of the value under `key`, if any.
    ///
    /// Expired entries are dropped on read.
    pub async fn get(&self, key: &str) -> Option<T> {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;

        let fresh = entries.get(key).map(|entry| entry.is_fresh_at(now))?;
        if fresh {
            entries.peek(key).map(|entry| entry.value.clone())
        } else {
            entries.pop(key);
            None
        }
    }

    /// Upsert `value` with the configured TTL; last writer wins
    pub async fn insert(&self, key: impl Into<String>, value: T) {
        let now = self.clock.now();
        let entry = CacheEntry {
            value,
            expires_at: now
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        self.entries.write().await.put(key.into(), entry);
    }

    pub async fn remove(&self, key: &str) -> Option<T> {
        self.entries.write().await.pop(key).map(|entry| entry.value)
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of stored entries, expired ones included until read or purged
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every expired entry, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;

        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| !entry.is_fresh_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            entries.pop(key);
        }

        expired.len()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
