//! Personalization preferences kept in local storage.

use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tracing::warn;

use crate::storage::{keys, LocalStorage};

/// Faculty and major the feed is filtered by.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Personalization {
  pub faculty: Option<String>,
  pub major: Option<String>,
  pub faculty_id: Option<i64>,
  pub major_id: Option<i64>,
}

/// Typed accessors over the raw preference keys.
#[derive(Clone)]
pub struct Preferences {
  storage: Arc<dyn LocalStorage>,
}

impl Preferences {
  pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
    Self { storage }
  }

  pub fn personalization(&self) -> Result<Personalization> {
    Ok(Personalization {
      faculty: self.text(keys::USER_FACULTY)?,
      major: self.text(keys::USER_MAJOR)?,
      faculty_id: self.id(keys::FACULTY_ID)?,
      major_id: self.id(keys::MAJOR_ID)?,
    })
  }

  /// Store every field; `None` clears the key.
  pub fn set_personalization(&self, prefs: &Personalization) -> Result<()> {
    self.put(keys::USER_FACULTY, prefs.faculty.clone())?;
    self.put(keys::USER_MAJOR, prefs.major.clone())?;
    self.put(keys::FACULTY_ID, prefs.faculty_id.map(|id| id.to_string()))?;
    self.put(keys::MAJOR_ID, prefs.major_id.map(|id| id.to_string()))?;
    Ok(())
  }

  /// Course codes marked as completed on the degree chart.
  pub fn courses(&self) -> Result<Vec<String>> {
    let Some(raw) = self.storage.get_item(keys::USER_COURSES)? else {
      return Ok(Vec::new());
    };
    match serde_json::from_str(&raw) {
      Ok(courses) => Ok(courses),
      Err(e) => {
        warn!("Ignoring unreadable course list: {}", e);
        Ok(Vec::new())
      }
    }
  }

  pub fn set_courses(&self, courses: &[String]) -> Result<()> {
    let raw = serde_json::to_string(courses)
      .map_err(|e| eyre!("Failed to serialize course list: {}", e))?;
    self.storage.set_item(keys::USER_COURSES, &raw)
  }

  /// Add or remove a course. Returns whether it is now completed.
  pub fn toggle_course(&self, code: &str) -> Result<bool> {
    let mut courses = self.courses()?;
    let completed = match courses.iter().position(|c| c == code) {
      Some(index) => {
        courses.remove(index);
        false
      }
      None => {
        courses.push(code.to_string());
        true
      }
    };
    self.set_courses(&courses)?;
    Ok(completed)
  }

  fn text(&self, key: &str) -> Result<Option<String>> {
    Ok(
      self
        .storage
        .get_item(key)?
        .filter(|value| !value.trim().is_empty()),
    )
  }

  fn id(&self, key: &str) -> Result<Option<i64>> {
    Ok(self.text(key)?.and_then(|raw| match raw.trim().parse() {
      Ok(id) => Some(id),
      Err(_) => {
        warn!("Ignoring non-numeric {}: {:?}", key, raw);
        None
      }
    }))
  }

  fn put(&self, key: &str, value: Option<String>) -> Result<()> {
    match value {
      Some(value) => self.storage.set_item(key, &value),
      None => self.storage.remove_item(key),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storage::MemoryStorage;

  fn prefs() -> (Arc<MemoryStorage>, Preferences) {
    let storage = Arc::new(MemoryStorage::new());
    let prefs = Preferences::new(storage.clone());
    (storage, prefs)
  }

  #[test]
  fn test_personalization_round_trip() {
    let (storage, prefs) = prefs();
    assert_eq!(prefs.personalization().unwrap(), Personalization::default());

    let value = Personalization {
      faculty: Some("Engineering".into()),
      major: Some("Computer Engineering".into()),
      faculty_id: Some(3),
      major_id: Some(12),
    };
    prefs.set_personalization(&value).unwrap();

    assert_eq!(prefs.personalization().unwrap(), value);
    assert_eq!(
      storage.get_item(keys::FACULTY_ID).unwrap().as_deref(),
      Some("3")
    );

    prefs
      .set_personalization(&Personalization {
        major_id: None,
        ..value
      })
      .unwrap();
    assert_eq!(storage.get_item(keys::MAJOR_ID).unwrap(), None);
  }

  #[test]
  fn test_bad_id_is_ignored() {
    let (storage, prefs) = prefs();
    storage.set_item(keys::FACULTY_ID, "abc").unwrap();
    assert_eq!(prefs.personalization().unwrap().faculty_id, None);
  }

  #[test]
  fn test_toggle_course() {
    let (storage, prefs) = prefs();

    assert!(prefs.toggle_course("CS101").unwrap());
    assert!(prefs.toggle_course("MATH201").unwrap());
    assert_eq!(prefs.courses().unwrap(), vec!["CS101", "MATH201"]);

    assert!(!prefs.toggle_course("CS101").unwrap());
    assert_eq!(
      storage.get_item(keys::USER_COURSES).unwrap().as_deref(),
      Some(r#"["MATH201"]"#)
    );
  }

  #[test]
  fn test_corrupt_course_list_reads_empty() {
    let (storage, prefs) = prefs();
    storage.set_item(keys::USER_COURSES, "not json").unwrap();
    assert!(prefs.courses().unwrap().is_empty());
  }
}
