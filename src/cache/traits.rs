//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A cached payload and the moment it was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
  pub data: Value,
  /// Epoch milliseconds
  pub timestamp: i64,
}

impl CacheEntry {
  pub fn cached_at(&self) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(self.timestamp)
  }
}

/// Key/value cache with time-based freshness.
///
/// Consumers only ever go through these accessors; the backing map and its
/// durable mirror stay private to the implementation.
pub trait CacheStore: Send + Sync {
  /// Entry for `key`, or `None` if missing or stale.
  fn get_entry(&self, key: &str) -> Option<CacheEntry>;

  /// Cached payload for `key`, or `None` if missing or stale.
  fn get(&self, key: &str) -> Option<Value> {
    self.get_entry(key).map(|entry| entry.data)
  }

  /// Store `data` under `key` stamped with the current time.
  fn set(&self, key: &str, data: Value) -> Result<()>;

  fn invalidate_key(&self, key: &str) -> Result<()>;

  fn invalidate_all(&self) -> Result<()>;
}

/// A query that can be turned into a stable cache key.
pub trait QueryKey {
  /// Stable, fixed-length key for the cache map.
  fn cache_hash(&self) -> String;

  /// Human readable description, used in logs.
  fn description(&self) -> String;
}

/// Source of "now" in epoch milliseconds.
pub trait Clock: Send + Sync {
  fn now_ms(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now_ms(&self) -> i64 {
    Utc::now().timestamp_millis()
  }
}

/// Clock that only moves when told to.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ManualClock {
  now: std::sync::atomic::AtomicI64,
}

#[cfg(test)]
impl ManualClock {
  pub fn new(now_ms: i64) -> Self {
    Self {
      now: std::sync::atomic::AtomicI64::new(now_ms),
    }
  }

  pub fn set(&self, now_ms: i64) {
    self.now.store(now_ms, std::sync::atomic::Ordering::SeqCst);
  }
}

#[cfg(test)]
impl Clock for ManualClock {
  fn now_ms(&self) -> i64 {
    self.now.load(std::sync::atomic::Ordering::SeqCst)
  }
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result from cached data.
  pub fn from_cache(data: T, cached_at: Option<DateTime<Utc>>) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
      cached_at,
    }
  }
}

/// Indicates where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still within its TTL
  Cache,
}
