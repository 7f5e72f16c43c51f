//! Result cache: bounded, TTL-based, lazily expired.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::domain::RequestKey;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    cached_at: Instant,
}

/// Successful results keyed by request key.
///
/// - An entry is fresh while `now - cached_at < ttl`. Stale entries are
///   dropped when looked up or when room is needed; there is no sweeper.
/// - At capacity, the entry with the oldest `cached_at` is evicted.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: HashMap<RequestKey, CacheEntry<V>>,
    ttl: Duration,
    capacity: usize,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            capacity,
        }
    }

    fn is_fresh(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.cached_at) < self.ttl
    }

    /// Fresh value for `key`, removing it if it has expired.
    pub fn get(&mut self, key: &RequestKey, now: Instant) -> Option<V> {
        let entry = self.entries.get(key)?;
        if self.is_fresh(entry, now) {
            return Some(entry.value.clone());
        }
        self.entries.remove(key);
        None
    }

    pub fn insert(&mut self, key: RequestKey, value: V, now: Instant) {
        if self.capacity == 0 {
            return;
        }

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.purge_expired(now);
            if self.entries.len() >= self.capacity {
                self.evict_oldest();
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                value,
                cached_at: now,
            },
        );
    }

    fn purge_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.cached_at) < ttl);
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.cached_at)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Stored entries, stale ones included until they are touched.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
