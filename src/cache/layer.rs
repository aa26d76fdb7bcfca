//! Cache layer that orchestrates caching logic with network fetching.

use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::traits::{CacheResult, CacheStore, QueryKey};

/// Cache-first fetch helper over any [`CacheStore`].
///
/// This layer sits between the service wrappers and the HTTP client. A fresh
/// entry short-circuits the fetch; a missing or stale one goes to the network
/// and the response replaces whatever was cached.
pub struct CacheLayer {
  store: Arc<dyn CacheStore>,
}

impl CacheLayer {
  pub fn new(store: Arc<dyn CacheStore>) -> Self {
    Self { store }
  }

  pub fn store(&self) -> &Arc<dyn CacheStore> {
    &self.store
  }

  /// Fetch with cache-first strategy.
  ///
  /// 1. Check cache - if fresh and decodable, return immediately
  /// 2. Otherwise fetch from network
  /// 3. Store the network result (a failed write is logged, not returned)
  pub async fn fetch<K, T, E, F, Fut>(&self, key: &K, fetcher: F) -> Result<CacheResult<T>, E>
  where
    K: QueryKey,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    let hash = key.cache_hash();

    if let Some(entry) = self.store.get_entry(&hash) {
      match serde_json::from_value::<T>(entry.data.clone()) {
        Ok(data) => {
          debug!("Cache hit: {}", key.description());
          return Ok(CacheResult::from_cache(data, entry.cached_at()));
        }
        Err(e) => warn!("Cached {} no longer decodes: {}", key.description(), e),
      }
    }

    debug!("Cache miss: {}", key.description());
    let data = fetcher().await?;

    match serde_json::to_value(&data) {
      Ok(value) => {
        if let Err(e) = self.store.set(&hash, value) {
          warn!("Failed to cache {}: {}", key.description(), e);
        }
      }
      Err(e) => warn!("Failed to serialize {} for cache: {}", key.description(), e),
    }

    Ok(CacheResult::from_network(data))
  }

  /// Drop the cached result for one query.
  pub fn invalidate<K: QueryKey>(&self, key: &K) {
    if let Err(e) = self.store.invalidate_key(&key.cache_hash()) {
      warn!("Failed to invalidate {}: {}", key.description(), e);
    }
  }

  /// Drop every cached query.
  pub fn invalidate_all(&self) {
    if let Err(e) = self.store.invalidate_all() {
      warn!("Failed to clear cache: {}", e);
    }
  }
}

impl Clone for CacheLayer {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
    }
  }
}
