//! Folio content cache.
//!
//! Holds normalized content per resource key for a bounded time window.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! ttl_seconds = 300
//! max_entries = 64
//! ```

mod config;
mod lock;
mod store;

pub use config::CacheConfig;
pub use store::{CacheEntry, ContentStore};

pub(crate) use store::{METRIC_CACHE_EVICT, METRIC_CACHE_HIT, METRIC_CACHE_MISS};
