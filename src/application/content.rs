//! Cached, failure-tolerant access to portfolio content.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use metrics::{counter, histogram};
use tracing::{debug, info, instrument, warn};

use crate::application::images::ImagePolicy;
use crate::application::normalize::normalize_items;
use crate::application::source::{ContentSource, FetchError};
use crate::cache::ContentStore;
use crate::domain::content::{Category, ContentItem, group_by_category};
use crate::domain::resources::ResourceKey;

pub(crate) const METRIC_FETCH_FAILURE: &str = "folio_fetch_failure_total";
pub(crate) const METRIC_FETCH_MS: &str = "folio_fetch_ms";

#[derive(Clone)]
pub struct ContentService {
    source: Arc<dyn ContentSource>,
    store: Arc<ContentStore>,
    images: Arc<ImagePolicy>,
}

impl ContentService {
    pub fn new(
        source: Arc<dyn ContentSource>,
        store: Arc<ContentStore>,
        images: ImagePolicy,
    ) -> Self {
        Self {
            source,
            store,
            images: Arc::new(images),
        }
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Content for `key`, from the cache when it is still fresh.
    ///
    /// Never fails: when the API cannot be reached or answers with something
    /// unusable, the last payload stored for `key` is returned regardless of
    /// its age, or an empty list when nothing was ever stored.
    #[instrument(skip(self, key), fields(resource = %key))]
    pub async fn fetch_content(&self, key: &ResourceKey) -> Vec<ContentItem> {
        if let Some(items) = self.store.get_fresh(key, Instant::now()) {
            debug!(count = items.len(), "serving cached content");
            return items;
        }

        match self.refresh(key).await {
            Ok(items) => items,
            Err(error) => {
                counter!(METRIC_FETCH_FAILURE, "kind" => error.kind()).increment(1);
                let fallback = self.store.get_stale(key);
                let now = Instant::now();
                let stale_age_secs = fallback
                    .as_ref()
                    .map(|entry| now.saturating_duration_since(entry.fetched_at).as_secs());
                warn!(
                    error = %error,
                    kind = error.kind(),
                    stale_fallback = fallback.is_some(),
                    stale_age_secs,
                    "content fetch failed"
                );
                fallback.map(|entry| entry.items).unwrap_or_default()
            }
        }
    }

    /// Fetch `key` from the API unconditionally and store the result.
    pub async fn refresh(&self, key: &ResourceKey) -> Result<Vec<ContentItem>, FetchError> {
        let started_at = Instant::now();
        let body = self.source.fetch(key).await;
        histogram!(METRIC_FETCH_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        let items = normalize_items(&body?, &self.images)?;
        self.store.put(key.clone(), items.clone(), Instant::now());
        info!(count = items.len(), "content refreshed");
        Ok(items)
    }

    /// Fetch several resources concurrently. Results follow the input order.
    pub async fn fetch_many(&self, keys: &[ResourceKey]) -> Vec<(ResourceKey, Vec<ContentItem>)> {
        join_all(keys.iter().map(|key| async move {
            let items = self.fetch_content(key).await;
            (key.clone(), items)
        }))
        .await
    }

    /// Look an item up by an identifier taken from user input.
    pub async fn find_item(&self, key: &ResourceKey, raw_id: &str) -> Option<ContentItem> {
        self.fetch_content(key)
            .await
            .into_iter()
            .find(|item| item.matches_id(raw_id))
    }

    /// All projects grouped by category.
    pub async fn categories(&self) -> Vec<Category> {
        group_by_category(self.fetch_content(&ResourceKey::Projects).await)
    }

    /// Drop everything, as a page reload would.
    pub fn clear(&self) {
        self.store.clear();
    }
}
