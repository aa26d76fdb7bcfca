//! Resource feed endpoints.

use reqwest::multipart::{Form, Part};
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::client::{ApiClient, Params};
use super::error::ApiError;
use super::page::{Page, Single};
use super::types::{Resource, SaveResponse, UpvoteResponse};
use crate::cache::QueryKey;
use crate::error::{ClientError, Result};
use crate::prefs::Personalization;
use crate::validate::ResourceDraft;

/// Filters and paging for the resource feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceQuery {
  pub search: Option<String>,
  pub faculty_id: Option<i64>,
  pub major_id: Option<i64>,
  pub sort: Option<String>,
  pub page: u32,
  pub per_page: u32,
}

impl ResourceQuery {
  pub fn new(per_page: u32) -> Self {
    Self {
      page: 1,
      per_page,
      ..Default::default()
    }
  }

  /// Feed query filtered by the user's faculty and major.
  pub fn personalized(prefs: &Personalization, per_page: u32) -> Self {
    Self {
      faculty_id: prefs.faculty_id,
      major_id: prefs.major_id,
      ..Self::new(per_page)
    }
  }

  pub fn with_search(mut self, search: impl Into<String>) -> Self {
    let search = search.into();
    self.search = (!search.trim().is_empty()).then_some(search);
    self
  }

  pub fn at_page(&self, page: u32) -> Self {
    Self {
      page,
      ..self.clone()
    }
  }

  fn filter_params(&self) -> Params {
    let mut params = Params::new();
    if let Some(search) = &self.search {
      params.push(("search", search.trim().to_string()));
    }
    if let Some(faculty_id) = self.faculty_id {
      params.push(("faculty_id", faculty_id.to_string()));
    }
    if let Some(major_id) = self.major_id {
      params.push(("major_id", major_id.to_string()));
    }
    if let Some(sort) = &self.sort {
      params.push(("sort", sort.clone()));
    }
    params
  }
}

impl QueryKey for ResourceQuery {
  fn cache_hash(&self) -> String {
    let input = format!(
      "resources:{}:{}:{}:{}:{}:{}",
      self
        .search
        .as_deref()
        .map(normalize_search)
        .unwrap_or_default(),
      self.faculty_id.map(|id| id.to_string()).unwrap_or_default(),
      self.major_id.map(|id| id.to_string()).unwrap_or_default(),
      self.sort.as_deref().unwrap_or(""),
      self.page,
      self.per_page,
    );

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }

  fn description(&self) -> String {
    match &self.search {
      Some(search) => format!("resources '{}' page {}", search, self.page),
      None => format!("resources page {}", self.page),
    }
  }
}

/// Trim and lowercase so equivalent searches share a cache entry.
fn normalize_search(search: &str) -> String {
  search.trim().to_lowercase()
}

impl ApiClient {
  pub async fn list_resources(
    &self,
    query: &ResourceQuery,
  ) -> std::result::Result<Page<Resource>, ApiError> {
    self
      .get_page("/resources", query.filter_params(), query.page, query.per_page)
      .await
  }

  pub async fn get_resource(&self, id: i64) -> std::result::Result<Resource, ApiError> {
    self.get_one(&format!("/resources/{}", id)).await
  }

  pub async fn create_resource(&self, draft: &ResourceDraft) -> Result<Resource> {
    draft.validate()?;
    let form = resource_form(draft).await?;
    let created: Single<Resource> = self.post_multipart("/resources", form).await?;
    Ok(created.into_inner())
  }

  pub async fn update_resource(&self, id: i64, draft: &ResourceDraft) -> Result<Resource> {
    draft.validate()?;
    let form = resource_form(draft).await?;
    let updated: Single<Resource> = self
      .put_multipart(&format!("/resources/{}", id), form)
      .await?;
    Ok(updated.into_inner())
  }

  pub async fn toggle_resource_upvote(
    &self,
    id: i64,
  ) -> std::result::Result<UpvoteResponse, ApiError> {
    self
      .post_empty(&format!("/resources/{}/toggle-upvote", id))
      .await
  }

  pub async fn toggle_resource_save(&self, id: i64) -> std::result::Result<SaveResponse, ApiError> {
    self
      .post_empty(&format!("/resources/{}/toggle-save", id))
      .await
  }
}

async fn resource_form(draft: &ResourceDraft) -> Result<Form> {
  let mut form = Form::new()
    .text("title", draft.title.trim().to_string())
    .text("description", draft.description.trim().to_string());

  if let Some(faculty_id) = draft.faculty_id {
    form = form.text("faculty_id", faculty_id.to_string());
  }
  if let Some(major_id) = draft.major_id {
    form = form.text("major_id", major_id.to_string());
  }

  if let Some(path) = &draft.file {
    let bytes = tokio::fs::read(path).await.map_err(|e| ClientError::File {
      path: path.display().to_string(),
      message: e.to_string(),
    })?;
    let file_name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "upload".to_string());
    form = form.part("file", Part::bytes(bytes).file_name(file_name));
  }

  Ok(form)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_equivalent_searches_share_key() {
    let a = ResourceQuery::new(10).with_search("  Calculus ");
    let b = ResourceQuery::new(10).with_search("calculus");
    assert_eq!(a.cache_hash(), b.cache_hash());
    assert_eq!(a.cache_hash().len(), 64);
  }

  #[test]
  fn test_pages_and_filters_have_distinct_keys() {
    let base = ResourceQuery::new(10);
    assert_ne!(base.cache_hash(), base.at_page(2).cache_hash());

    let filtered = ResourceQuery {
      faculty_id: Some(3),
      ..base.clone()
    };
    assert_ne!(base.cache_hash(), filtered.cache_hash());
  }

  #[test]
  fn test_blank_search_is_dropped() {
    let query = ResourceQuery::new(10).with_search("   ");
    assert_eq!(query.search, None);
    assert!(query.filter_params().is_empty());
  }

  #[test]
  fn test_personalized_query_params() {
    let prefs = Personalization {
      faculty_id: Some(2),
      major_id: Some(14),
      ..Default::default()
    };
    let query = ResourceQuery::personalized(&prefs, 5);
    assert_eq!(
      query.filter_params(),
      vec![
        ("faculty_id", "2".to_string()),
        ("major_id", "14".to_string())
      ]
    );
    assert_eq!(query.page, 1);
    assert_eq!(query.per_page, 5);
  }

  #[tokio::test]
  async fn test_missing_upload_file_is_reported() {
    let draft = ResourceDraft {
      title: "Notes".into(),
      description: "Week 1".into(),
      file: Some("/definitely/not/here.pdf".into()),
      ..Default::default()
    };
    let err = resource_form(&draft).await.unwrap_err();
    assert!(matches!(err, ClientError::File { .. }));
  }
}
