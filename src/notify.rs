//! Transient notifications shown at the bottom of the screen.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How long a notification stays visible
pub const LIFETIME: Duration = Duration::from_secs(4);

const CAPACITY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
  Info,
  Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
  pub level: Level,
  pub message: String,
  pub created_at: Instant,
}

impl Notification {
  pub fn is_expired(&self, now: Instant) -> bool {
    now.saturating_duration_since(self.created_at) >= LIFETIME
  }
}

/// Bounded queue; the newest unexpired notification is the one displayed.
#[derive(Debug, Default)]
pub struct Notifications {
  queue: VecDeque<Notification>,
}

impl Notifications {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn info(&mut self, message: impl Into<String>) {
    self.push(Level::Info, message.into(), Instant::now());
  }

  pub fn error(&mut self, message: impl Into<String>) {
    self.push(Level::Error, message.into(), Instant::now());
  }

  pub fn push(&mut self, level: Level, message: String, now: Instant) {
    if self.queue.len() == CAPACITY {
      self.queue.pop_front();
    }
    self.queue.push_back(Notification {
      level,
      message,
      created_at: now,
    });
  }

  pub fn latest(&self, now: Instant) -> Option<&Notification> {
    self.queue.back().filter(|n| !n.is_expired(now))
  }

  /// Drop expired notifications. Returns `true` if any were removed.
  pub fn prune(&mut self, now: Instant) -> bool {
    let before = self.queue.len();
    self.queue.retain(|n| !n.is_expired(now));
    self.queue.len() != before
  }

  pub fn len(&self) -> usize {
    self.queue.len()
  }

  pub fn is_empty(&self) -> bool {
    self.queue.is_empty()
  }
}
