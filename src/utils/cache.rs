//! Explicit TTL cache for fetched backend data

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A process-local cache with a fixed staleness window
///
/// Entries expire `ttl` after insertion; reads evict stale entries. The cache
/// holds fetched data only, never derived scores, and the owning client must
/// invalidate it after every mutation.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, (Instant, V)>,
}

impl<K: Eq + Hash, V> TtlCache<K, V> {
    /// Create a cache with the given staleness window
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// The configured staleness window
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a fresh entry, evicting it first if stale
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let stale = match self.entries.get(key) {
            Some((inserted_at, _)) => inserted_at.elapsed() >= self.ttl,
            None => return None,
        };

        if stale {
            self.entries.remove(key);
            return None;
        }

        self.entries.get(key).map(|(_, value)| value)
    }

    /// Insert or replace an entry, resetting its age
    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, (Instant::now(), value));
    }

    /// Drop a single entry; returns whether one was present
    pub fn invalidate(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
