//! Content cache storage.
//!
//! Entries are keyed by [`ResourceKey`] and carry their fetch time. Expired
//! entries stay in place so they can serve as a fallback when a refresh
//! fails; they are only replaced by the next successful fetch.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use lru::LruCache;
use metrics::counter;

use crate::domain::content::ContentItem;
use crate::domain::resources::ResourceKey;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

pub(crate) const METRIC_CACHE_HIT: &str = "folio_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "folio_cache_miss_total";
pub(crate) const METRIC_CACHE_EVICT: &str = "folio_cache_evict_total";

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: ResourceKey,
    pub items: Vec<ContentItem>,
    pub fetched_at: Instant,
}

impl CacheEntry {
    /// An entry is valid while `now - fetched_at < ttl`.
    pub fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

/// In-memory TTL store for normalized content.
pub struct ContentStore {
    ttl: Duration,
    entries: RwLock<LruCache<ResourceKey, CacheEntry>>,
}

impl ContentStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            ttl: config.ttl,
            entries: RwLock::new(LruCache::new(config.max_entries_non_zero())),
        }
    }

    /// Items for `key` if an entry exists and is still within the TTL.
    pub fn get_fresh(&self, key: &ResourceKey, now: Instant) -> Option<Vec<ContentItem>> {
        let mut entries = rw_write(&self.entries, SOURCE, "get_fresh");
        match entries.get(key) {
            Some(entry) if entry.is_fresh(self.ttl, now) => {
                counter!(METRIC_CACHE_HIT, "resource" => key.to_string()).increment(1);
                Some(entry.items.clone())
            }
            _ => {
                counter!(METRIC_CACHE_MISS, "resource" => key.to_string()).increment(1);
                None
            }
        }
    }

    /// Items for `key` regardless of age.
    pub fn get_stale(&self, key: &ResourceKey) -> Option<CacheEntry> {
        rw_read(&self.entries, SOURCE, "get_stale")
            .peek(key)
            .cloned()
    }

    /// Store a fresh payload, replacing any previous entry for the key.
    pub fn put(&self, key: ResourceKey, items: Vec<ContentItem>, now: Instant) {
        let entry = CacheEntry {
            key: key.clone(),
            items,
            fetched_at: now,
        };
        // `push` also hands back the replaced entry when the key was present
        let evicted = rw_write(&self.entries, SOURCE, "put")
            .push(key.clone(), entry)
            .filter(|(evicted_key, _)| *evicted_key != key);
        if let Some((evicted_key, _)) = evicted {
            counter!(METRIC_CACHE_EVICT, "resource" => evicted_key.to_string()).increment(1);
        }
    }

    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
