//! Durable client-side key/value storage.
//!
//! Everything the client persists between runs (the resource cache blob, the auth
//! token, personalization filters) goes through [`LocalStorage`] as opaque strings.
//! The SQLite adapter is the default; [`MemoryStorage`] backs tests and the
//! no-persist mode.

mod sqlite;

use color_eyre::{eyre::eyre, Result};
use std::collections::HashMap;
use std::sync::Mutex;

pub use sqlite::SqliteStorage;

/// Well-known storage keys.
pub mod keys {
  pub const RESOURCE_CACHE: &str = "resourceCache";
  pub const AUTH_TOKEN: &str = "authToken";
  pub const USER_FACULTY: &str = "userFaculty";
  pub const USER_MAJOR: &str = "userMajor";
  pub const FACULTY_ID: &str = "faculty_id";
  pub const MAJOR_ID: &str = "major_id";
  pub const USER_COURSES: &str = "userCourses";
}

/// String key/value store that survives process restarts.
pub trait LocalStorage: Send + Sync {
  fn get_item(&self, key: &str) -> Result<Option<String>>;

  fn set_item(&self, key: &str, value: &str) -> Result<()>;

  fn remove_item(&self, key: &str) -> Result<()>;
}

/// Storage that lives only as long as the process.
#[derive(Default)]
pub struct MemoryStorage {
  items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

impl LocalStorage for MemoryStorage {
  fn get_item(&self, key: &str) -> Result<Option<String>> {
    let items = self
      .items
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(items.get(key).cloned())
  }

  fn set_item(&self, key: &str, value: &str) -> Result<()> {
    let mut items = self
      .items
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    items.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove_item(&self, key: &str) -> Result<()> {
    let mut items = self
      .items
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    items.remove(key);
    Ok(())
  }
}
