//! API client with transparent caching of resource listings.

use std::future::Future;
use tracing::{debug, info};

use super::client::ApiClient;
use super::error::ApiError;
use super::page::Page;
use super::resources::ResourceQuery;
use super::types::{Comment, Poll, Resource, SaveResponse, UpvoteResponse, VoteResult};
use crate::cache::CacheLayer;
use crate::error::Result;
use crate::validate::{PollDraft, ResourceDraft};

/// Wraps [`ApiClient`] so resource feed queries are served from the cache
/// while fresh, and every action that can change those listings clears it.
#[derive(Clone)]
pub struct CachedApi {
  inner: ApiClient,
  cache: CacheLayer,
}

impl CachedApi {
  pub fn new(inner: ApiClient, cache: CacheLayer) -> Self {
    Self { inner, cache }
  }

  /// The uncached client, for endpoints that are never cached.
  pub fn client(&self) -> &ApiClient {
    &self.inner
  }

  pub fn cache(&self) -> &CacheLayer {
    &self.cache
  }

  /// List resources, cache-first.
  pub async fn list_resources(
    &self,
    query: &ResourceQuery,
  ) -> std::result::Result<Page<Resource>, ApiError> {
    let result = self
      .cache
      .fetch(query, || {
        let inner = self.inner.clone();
        let query = query.clone();
        async move { inner.list_resources(&query).await }
      })
      .await?;

    Ok(result.data)
  }

  /// List resources, skipping (and replacing) any cached copy.
  pub async fn refresh_resources(
    &self,
    query: &ResourceQuery,
  ) -> std::result::Result<Page<Resource>, ApiError> {
    self.cache.invalidate(query);
    self.list_resources(query).await
  }

  pub async fn toggle_resource_upvote(
    &self,
    id: i64,
  ) -> std::result::Result<UpvoteResponse, ApiError> {
    let response = self.inner.toggle_resource_upvote(id).await?;
    self.invalidate("upvote");
    Ok(response)
  }

  pub async fn toggle_resource_save(&self, id: i64) -> std::result::Result<SaveResponse, ApiError> {
    let response = self.inner.toggle_resource_save(id).await?;
    self.invalidate("save");
    Ok(response)
  }

  pub async fn create_resource(&self, draft: &ResourceDraft) -> Result<Resource> {
    let resource = self.inner.create_resource(draft).await?;
    self.invalidate("create");
    Ok(resource)
  }

  pub async fn update_resource(&self, id: i64, draft: &ResourceDraft) -> Result<Resource> {
    let resource = self.inner.update_resource(id, draft).await?;
    self.invalidate("update");
    Ok(resource)
  }

  pub async fn add_comment(
    &self,
    resource_id: i64,
    body: &str,
  ) -> std::result::Result<Comment, ApiError> {
    let comment = self.inner.add_comment(resource_id, body).await?;
    self.invalidate("comment");
    Ok(comment)
  }

  pub async fn edit_comment(
    &self,
    comment_id: i64,
    body: &str,
  ) -> std::result::Result<Comment, ApiError> {
    let comment = self.inner.edit_comment(comment_id, body).await?;
    self.invalidate("comment edit");
    Ok(comment)
  }

  pub async fn delete_comment(&self, comment_id: i64) -> std::result::Result<(), ApiError> {
    self.inner.delete_comment(comment_id).await?;
    self.invalidate("comment delete");
    Ok(())
  }

  pub async fn toggle_comment_upvote(
    &self,
    comment_id: i64,
  ) -> std::result::Result<UpvoteResponse, ApiError> {
    let response = self.inner.toggle_comment_upvote(comment_id).await?;
    self.invalidate("comment upvote");
    Ok(response)
  }

  /// Polls are embedded in resource listings, so both of these clear the cache.
  pub async fn create_poll(&self, resource_id: i64, draft: &PollDraft) -> Result<Poll> {
    let poll = self.inner.create_poll(resource_id, draft).await?;
    self.invalidate("poll create");
    Ok(poll)
  }

  pub async fn vote_poll_option(&self, option_id: i64) -> std::result::Result<VoteResult, ApiError> {
    let result = self.inner.vote_poll_option(option_id).await?;
    self.invalidate("vote");
    Ok(result)
  }

  /// Log out and drop everything cached for the session.
  pub fn logout(&self) -> Result<()> {
    self.inner.logout()?;
    self.cache.invalidate_all();
    Ok(())
  }

  /// Run a whole CLI or TUI session. With `clear_on_exit` the cache is emptied
  /// afterwards, including when the session failed.
  pub async fn session<T>(&self, clear_on_exit: bool, session: impl Future<Output = T>) -> T {
    let output = session.await;
    if clear_on_exit {
      info!("Clearing response cache on exit");
      self.cache.invalidate_all();
    }
    output
  }

  fn invalidate(&self, reason: &str) {
    debug!("Clearing resource cache after {}", reason);
    self.cache.invalidate_all();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::stub_server::StubServer;
  use crate::api::types::VoteOutcome;
  use crate::cache::{CacheStore, ResourceCache, DEFAULT_TTL};
  use crate::config::ApiConfig;
  use crate::storage::MemoryStorage;
  use serde_json::json;
  use std::sync::Arc;

  fn cached_api(base_url: &str) -> (CachedApi, Arc<ResourceCache>) {
    let storage = Arc::new(MemoryStorage::new());
    let store = Arc::new(ResourceCache::load(storage.clone(), DEFAULT_TTL).unwrap());
    store
      .set("resources:feed", json!({"data": [{"id": 1, "title": "Notes"}]}))
      .unwrap();
    let config = ApiConfig {
      base_url: base_url.to_string(),
      timeout_secs: 5,
    };
    let api = CachedApi::new(
      ApiClient::new(&config, storage).unwrap(),
      CacheLayer::new(store.clone()),
    );
    (api, store)
  }

  #[tokio::test]
  async fn test_poll_vote_clears_cached_listings() {
    let server = StubServer::respond(200, r#"{"message":"Vote recorded"}"#).await;
    let (api, store) = cached_api(server.base_url());
    assert_eq!(store.len(), 1);

    let result = api.vote_poll_option(3).await.unwrap();

    assert_eq!(result.outcome, VoteOutcome::Recorded);
    assert!(store.is_empty());
    assert!(server
      .request()
      .await
      .starts_with("POST /api/poll-options/3/vote HTTP/1.1"));
  }

  #[tokio::test]
  async fn test_comment_upvote_clears_cached_listings() {
    let server = StubServer::respond(200, r#"{"upvote_count":2,"is_upvoted":true}"#).await;
    let (api, store) = cached_api(server.base_url());

    api.toggle_comment_upvote(5).await.unwrap();

    assert!(store.is_empty());
    server.request().await;
  }

  #[tokio::test]
  async fn test_failed_session_still_clears_cache() {
    let (api, store) = cached_api("http://127.0.0.1:9");

    let result: std::result::Result<(), &str> =
      api.session(true, async { Err("terminal lost") }).await;

    assert_eq!(result, Err("terminal lost"));
    assert!(store.is_empty());
  }

  #[tokio::test]
  async fn test_session_keeps_cache_when_not_clearing() {
    let (api, store) = cached_api("http://127.0.0.1:9");

    api.session(false, async {}).await;

    assert_eq!(store.len(), 1);
  }

  #[tokio::test]
  async fn test_failed_vote_keeps_cache() {
    let server = StubServer::respond(500, r#"{"message":"Server Error"}"#).await;
    let (api, store) = cached_api(server.base_url());

    let err = api.vote_poll_option(3).await.unwrap_err();

    assert_eq!(err.status, Some(500));
    assert_eq!(store.len(), 1);
    server.request().await;
  }
}
