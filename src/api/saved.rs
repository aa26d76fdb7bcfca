//! Saved (bookmarked) resources.

use super::client::{ApiClient, Params};
use super::error::ApiError;
use super::page::Page;
use super::types::SavedItem;

impl ApiClient {
  /// Saved items in the order the user saved them. Items whose resource was
  /// deleted are kept in place with an empty `resource`.
  pub async fn list_saved(
    &self,
    page: u32,
    per_page: u32,
  ) -> std::result::Result<Page<SavedItem>, ApiError> {
    self
      .get_page("/saved-resources", Params::new(), page, per_page)
      .await
  }
}
