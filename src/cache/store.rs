//! TTL cache mirrored to local storage.

use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::{CacheEntry, CacheStore, Clock, SystemClock};
use crate::storage::{keys, LocalStorage};

/// Default time-to-live for cached entries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// In-memory cache map that is written through to local storage on every change.
///
/// The whole map is serialized as one JSON object under [`keys::RESOURCE_CACHE`]
/// and reloaded from there on construction. Entries are never evicted; an entry
/// older than the TTL is simply reported as absent.
pub struct ResourceCache {
  entries: Mutex<HashMap<String, CacheEntry>>,
  storage: Arc<dyn LocalStorage>,
  clock: Arc<dyn Clock>,
  ttl_ms: i64,
}

impl ResourceCache {
  /// Load the cache from storage using the wall clock.
  pub fn load(storage: Arc<dyn LocalStorage>, ttl: Duration) -> Result<Self> {
    Self::load_with_clock(storage, Arc::new(SystemClock), ttl)
  }

  pub fn load_with_clock(
    storage: Arc<dyn LocalStorage>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
  ) -> Result<Self> {
    let entries = match storage.get_item(keys::RESOURCE_CACHE)? {
      Some(blob) => match serde_json::from_str::<HashMap<String, CacheEntry>>(&blob) {
        Ok(entries) => {
          debug!("Rehydrated {} cache entries", entries.len());
          entries
        }
        Err(e) => {
          warn!("Discarding unreadable cache blob: {}", e);
          HashMap::new()
        }
      },
      None => HashMap::new(),
    };

    Ok(Self {
      entries: Mutex::new(entries),
      storage,
      clock,
      ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
    })
  }

  /// Number of entries held, fresh or not.
  pub fn len(&self) -> usize {
    self.lock().map(|entries| entries.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, CacheEntry>>> {
    self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))
  }

  fn is_fresh(&self, entry: &CacheEntry, now_ms: i64) -> bool {
    now_ms - entry.timestamp < self.ttl_ms
  }

  /// Mirror the full map to storage.
  fn persist(&self, entries: &HashMap<String, CacheEntry>) -> Result<()> {
    if entries.is_empty() {
      return self.storage.remove_item(keys::RESOURCE_CACHE);
    }
    let blob =
      serde_json::to_string(entries).map_err(|e| eyre!("Failed to serialize cache: {}", e))?;
    self.storage.set_item(keys::RESOURCE_CACHE, &blob)
  }
}

impl CacheStore for ResourceCache {
  fn get_entry(&self, key: &str) -> Option<CacheEntry> {
    let entries = self.lock().ok()?;
    let entry = entries.get(key)?;
    if self.is_fresh(entry, self.clock.now_ms()) {
      Some(entry.clone())
    } else {
      None
    }
  }

  fn set(&self, key: &str, data: Value) -> Result<()> {
    let mut entries = self.lock()?;
    entries.insert(
      key.to_string(),
      CacheEntry {
        data,
        timestamp: self.clock.now_ms(),
      },
    );
    self.persist(&entries)
  }

  fn invalidate_key(&self, key: &str) -> Result<()> {
    let mut entries = self.lock()?;
    if entries.remove(key).is_some() {
      self.persist(&entries)?;
    }
    Ok(())
  }

  fn invalidate_all(&self) -> Result<()> {
    let mut entries = self.lock()?;
    entries.clear();
    self.persist(&entries)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::traits::ManualClock;
  use crate::storage::MemoryStorage;
  use serde_json::json;

  fn cache_at(storage: Arc<MemoryStorage>, clock: Arc<ManualClock>) -> ResourceCache {
    ResourceCache::load_with_clock(storage, clock, DEFAULT_TTL).unwrap()
  }

  #[test]
  fn test_entry_expires_after_ttl() {
    let storage = Arc::new(MemoryStorage::new());
    let clock = Arc::new(ManualClock::new(0));
    let cache = cache_at(storage, clock.clone());

    cache.set("resources:page=1", json!([1, 2, 3])).unwrap();

    clock.set(299_999);
    assert_eq!(cache.get("resources:page=1"), Some(json!([1, 2, 3])));

    clock.set(300_000);
    assert_eq!(cache.get("resources:page=1"), None);

    clock.set(300_001);
    assert_eq!(cache.get("resources:page=1"), None);
  }

  #[test]
  fn test_survives_reload() {
    let storage = Arc::new(MemoryStorage::new());
    let clock = Arc::new(ManualClock::new(1_000));

    let cache = cache_at(storage.clone(), clock.clone());
    cache
      .set("q", json!({"data": [{"id": 7, "title": "Notes"}]}))
      .unwrap();
    drop(cache);

    clock.set(60_000);
    let reloaded = cache_at(storage, clock);
    assert_eq!(
      reloaded.get("q"),
      Some(json!({"data": [{"id": 7, "title": "Notes"}]}))
    );
    assert_eq!(reloaded.get_entry("q").unwrap().timestamp, 1_000);
  }

  #[test]
  fn test_stale_entry_reloaded_is_still_absent() {
    let storage = Arc::new(MemoryStorage::new());
    let clock = Arc::new(ManualClock::new(0));
    cache_at(storage.clone(), clock.clone())
      .set("q", json!(1))
      .unwrap();

    clock.set(400_000);
    let reloaded = cache_at(storage, clock);
    assert_eq!(reloaded.get("q"), None);
    // Stale entries are not evicted
    assert_eq!(reloaded.len(), 1);
  }

  #[test]
  fn test_invalidate_key_and_all() {
    let storage = Arc::new(MemoryStorage::new());
    let clock = Arc::new(ManualClock::new(0));
    let cache = cache_at(storage.clone(), clock.clone());

    cache.set("a", json!("a")).unwrap();
    cache.set("b", json!("b")).unwrap();

    cache.invalidate_key("a").unwrap();
    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.get("b"), Some(json!("b")));
    assert_eq!(cache_at(storage.clone(), clock.clone()).len(), 1);

    cache.invalidate_all().unwrap();
    assert!(cache.is_empty());
    assert_eq!(storage.get_item(keys::RESOURCE_CACHE).unwrap(), None);
  }

  #[test]
  fn test_corrupt_blob_starts_empty() {
    let storage = Arc::new(MemoryStorage::new());
    storage
      .set_item(keys::RESOURCE_CACHE, "{not json")
      .unwrap();

    let cache = cache_at(storage, Arc::new(ManualClock::new(0)));
    assert!(cache.is_empty());
  }

  #[test]
  fn test_last_write_wins() {
    let storage = Arc::new(MemoryStorage::new());
    let clock = Arc::new(ManualClock::new(0));
    let cache = cache_at(storage, clock.clone());

    cache.set("q", json!("first")).unwrap();
    clock.set(10);
    cache.set("q", json!("second")).unwrap();

    let entry = cache.get_entry("q").unwrap();
    assert_eq!(entry.data, json!("second"));
    assert_eq!(entry.timestamp, 10);
  }
}
