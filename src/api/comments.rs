//! Comment endpoints.

use serde_json::json;

use super::client::{ApiClient, Params};
use super::error::ApiError;
use super::page::{Page, Single};
use super::types::{Comment, UpvoteResponse};

type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiClient {
  pub async fn list_comments(
    &self,
    resource_id: i64,
    page: u32,
    per_page: u32,
  ) -> ApiResult<Page<Comment>> {
    self
      .get_page(
        &format!("/resources/{}/comments", resource_id),
        Params::new(),
        page,
        per_page,
      )
      .await
  }

  pub async fn add_comment(&self, resource_id: i64, body: &str) -> ApiResult<Comment> {
    let created: Single<Comment> = self
      .post(
        &format!("/resources/{}/comments", resource_id),
        &json!({ "body": body }),
      )
      .await?;
    Ok(created.into_inner())
  }

  pub async fn edit_comment(&self, comment_id: i64, body: &str) -> ApiResult<Comment> {
    let updated: Single<Comment> = self
      .put(
        &format!("/comments/{}", comment_id),
        &json!({ "body": body }),
      )
      .await?;
    Ok(updated.into_inner())
  }

  pub async fn delete_comment(&self, comment_id: i64) -> ApiResult<()> {
    self.delete(&format!("/comments/{}", comment_id)).await
  }

  pub async fn toggle_comment_upvote(&self, comment_id: i64) -> ApiResult<UpvoteResponse> {
    self
      .post_empty(&format!("/comments/{}/toggle-upvote", comment_id))
      .await
  }
}
