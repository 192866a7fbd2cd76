//! Time-to-live cache for list-style reads.
//!
//! Entries are never invalidated by writes; they simply age out. A read within
//! the TTL after a commit can therefore return the pre-commit listing. Callers
//! that need fresh data pass a force-refresh flag instead.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Default lifetime of a cached listing: 30 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

pub struct TtlCache<V> {
    ttl: Duration,
    entries: HashMap<String, CacheEntry<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached value if it was stored less than one TTL ago.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;
        if entry.stored_at.elapsed() < self.ttl {
            debug!(key, "cache hit");
            Some(entry.value.clone())
        } else {
            debug!(key, "cache entry expired");
            None
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop entries that can no longer be served.
    pub fn purge_expired(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
