//! Keyed tracker of mutations that have not settled yet.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Set of target keys with a mutation in flight.
///
/// Acquiring a key hands back a guard; the key is released when the guard is
/// dropped, however the mutation ended.
#[derive(Clone, Default)]
pub struct InFlight {
  keys: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
  pub fn new() -> Self {
    Self::default()
  }

  /// Claim `key`, or `None` if it is already claimed.
  pub fn try_acquire(&self, key: &str) -> Option<InFlightGuard> {
    let mut keys = lock(&self.keys);
    if !keys.insert(key.to_string()) {
      return None;
    }
    Some(InFlightGuard {
      key: key.to_string(),
      keys: Arc::clone(&self.keys),
    })
  }

  pub fn is_pending(&self, key: &str) -> bool {
    lock(&self.keys).contains(key)
  }

  pub fn len(&self) -> usize {
    lock(&self.keys).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

// The set holds no invariants a panic could break
fn lock(keys: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
  keys.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases its key on drop.
#[derive(Debug)]
pub struct InFlightGuard {
  key: String,
  keys: Arc<Mutex<HashSet<String>>>,
}

impl InFlightGuard {
  pub fn key(&self) -> &str {
    &self.key
  }
}

impl Drop for InFlightGuard {
  fn drop(&mut self) {
    lock(&self.keys).remove(&self.key);
  }
}
