//! Study groups, class-exchange requests and applications.

use serde_json::json;

use super::client::{ApiClient, Params};
use super::error::ApiError;
use super::page::{Page, Single};
use super::types::{Application, ApplicationStatus, ExchangeRequest, StudyGroup};

type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiClient {
  pub async fn list_study_groups(
    &self,
    search: Option<&str>,
    page: u32,
    per_page: u32,
  ) -> ApiResult<Page<StudyGroup>> {
    let mut params = Params::new();
    if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
      params.push(("search", search.to_string()));
    }
    self
      .get_page("/study-groups", params, page, per_page)
      .await
  }

  pub async fn join_study_group(&self, group_id: i64) -> ApiResult<StudyGroup> {
    let group: Single<StudyGroup> = self
      .post_empty(&format!("/study-groups/{}/join", group_id))
      .await?;
    Ok(group.into_inner())
  }

  pub async fn list_requests(&self, page: u32, per_page: u32) -> ApiResult<Page<ExchangeRequest>> {
    self
      .get_page("/requests", Params::new(), page, per_page)
      .await
  }

  pub async fn get_application(&self, application_id: i64) -> ApiResult<Application> {
    self
      .get_one(&format!("/applications/{}", application_id))
      .await
  }

  pub async fn update_application(
    &self,
    application_id: i64,
    status: ApplicationStatus,
  ) -> ApiResult<Application> {
    let updated: Single<Application> = self
      .put(
        &format!("/applications/{}", application_id),
        &json!({ "status": status }),
      )
      .await?;
    Ok(updated.into_inner())
  }
}
