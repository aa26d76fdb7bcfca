use color_eyre::{eyre::eyre, Result};
use reqwest::multipart::Form;
use reqwest::{header, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::error::ApiError;
use super::page::{Page, RawPage, Single};
use crate::config::ApiConfig;
use crate::storage::{keys, LocalStorage};

/// Query string parameters.
pub type Params = Vec<(&'static str, String)>;

enum Payload {
  Empty,
  Json(Value),
  Form(Form),
}

/// HTTP client for the platform's REST API.
///
/// Every request goes through here: the bearer token is read from local storage
/// on each call, a fixed timeout applies, and failures are normalized into
/// [`ApiError`]. No retries.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: String,
  storage: Arc<dyn LocalStorage>,
}

impl ApiClient {
  pub fn new(config: &ApiConfig, storage: Arc<dyn LocalStorage>) -> Result<Self> {
    let base_url = config.base_url.trim_end_matches('/').to_string();
    Url::parse(&base_url).map_err(|e| eyre!("Invalid API base URL {}: {}", base_url, e))?;

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url,
      storage,
    })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  pub(crate) fn storage(&self) -> &Arc<dyn LocalStorage> {
    &self.storage
  }

  /// Absolute URL for a path relative to the base URL.
  pub fn url(&self, path: &str) -> String {
    format!("{}/{}", self.base_url, path.trim_start_matches('/'))
  }

  fn token(&self) -> Option<String> {
    match self.storage.get_item(keys::AUTH_TOKEN) {
      Ok(token) => token.filter(|t| !t.is_empty()),
      Err(e) => {
        warn!("Failed to read auth token: {}", e);
        None
      }
    }
  }

  async fn send<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    params: &[(&'static str, String)],
    payload: Payload,
  ) -> std::result::Result<T, ApiError> {
    let url = self.url(path);
    let parsed = Url::parse(&url).map_err(|e| ApiError::invalid_request(e, &url, &method))?;

    let mut request = self
      .http
      .request(method.clone(), parsed)
      .header(header::ACCEPT, "application/json");

    if !params.is_empty() {
      request = request.query(params);
    }
    if let Some(token) = self.token() {
      request = request.bearer_auth(token);
    }
    request = match payload {
      Payload::Empty => request,
      Payload::Json(body) => request.json(&body),
      Payload::Form(form) => request.multipart(form),
    };

    debug!("{} {}", method, url);

    let response = request
      .send()
      .await
      .map_err(|e| ApiError::from_transport(&e, &url, &method))?;

    let status = response.status();
    let text = response
      .text()
      .await
      .map_err(|e| ApiError::from_transport(&e, &url, &method))?;

    if !status.is_success() {
      let err = ApiError::from_response(status.as_u16(), &text, &url, &method);
      debug!("{} {} failed: {} ({})", method, url, err.message, status);
      return Err(err);
    }

    // Empty bodies (204, bare DELETEs) decode as null
    let value = if text.trim().is_empty() {
      Value::Null
    } else {
      serde_json::from_str(&text).map_err(|e| ApiError::invalid_response(e, &url, &method))?
    };

    serde_json::from_value(value).map_err(|e| ApiError::invalid_response(e, &url, &method))
  }

  pub async fn get<T: DeserializeOwned>(
    &self,
    path: &str,
    params: &[(&'static str, String)],
  ) -> std::result::Result<T, ApiError> {
    self.send(Method::GET, path, params, Payload::Empty).await
  }

  /// GET a single record, accepting both bare and `{data: ...}` bodies.
  pub async fn get_one<T: DeserializeOwned>(&self, path: &str) -> std::result::Result<T, ApiError> {
    let single: Single<T> = self.get(path, &[]).await?;
    Ok(single.into_inner())
  }

  /// GET one page of a list endpoint, normalized into [`Page`].
  pub async fn get_page<T: DeserializeOwned>(
    &self,
    path: &str,
    mut params: Params,
    page: u32,
    per_page: u32,
  ) -> std::result::Result<Page<T>, ApiError> {
    params.push(("page", page.to_string()));
    params.push(("per_page", per_page.to_string()));

    let raw: RawPage<T> = self.get(path, &params).await?;
    Ok(raw.into_page(page))
  }

  pub async fn post<T: DeserializeOwned, B: Serialize>(
    &self,
    path: &str,
    body: &B,
  ) -> std::result::Result<T, ApiError> {
    let body = self.json_body(&Method::POST, path, body)?;
    self.send(Method::POST, path, &[], body).await
  }

  /// POST without a body.
  pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> std::result::Result<T, ApiError> {
    self.send(Method::POST, path, &[], Payload::Empty).await
  }

  pub async fn put<T: DeserializeOwned, B: Serialize>(
    &self,
    path: &str,
    body: &B,
  ) -> std::result::Result<T, ApiError> {
    let body = self.json_body(&Method::PUT, path, body)?;
    self.send(Method::PUT, path, &[], body).await
  }

  pub async fn delete(&self, path: &str) -> std::result::Result<(), ApiError> {
    let _: Value = self.send(Method::DELETE, path, &[], Payload::Empty).await?;
    Ok(())
  }

  /// POST a multipart form (file uploads).
  pub async fn post_multipart<T: DeserializeOwned>(
    &self,
    path: &str,
    form: Form,
  ) -> std::result::Result<T, ApiError> {
    self.send(Method::POST, path, &[], Payload::Form(form)).await
  }

  /// Multipart update. Sent as POST with `_method=PUT`, which the backend
  /// treats as a PUT (multipart bodies are only parsed on POST).
  pub async fn put_multipart<T: DeserializeOwned>(
    &self,
    path: &str,
    form: Form,
  ) -> std::result::Result<T, ApiError> {
    let form = form.text("_method", "PUT");
    self.send(Method::POST, path, &[], Payload::Form(form)).await
  }

  fn json_body<B: Serialize>(
    &self,
    method: &Method,
    path: &str,
    body: &B,
  ) -> std::result::Result<Payload, ApiError> {
    serde_json::to_value(body)
      .map(Payload::Json)
      .map_err(|e| ApiError::invalid_request(e, &self.url(path), method))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::stub_server::StubServer;
  use crate::storage::MemoryStorage;

  fn client(base_url: &str) -> ApiClient {
    let config = ApiConfig {
      base_url: base_url.to_string(),
      timeout_secs: 5,
    };
    ApiClient::new(&config, Arc::new(MemoryStorage::new())).unwrap()
  }

  #[test]
  fn test_url_joining() {
    let api = client("https://campus.example/api/");
    assert_eq!(api.base_url(), "https://campus.example/api");
    assert_eq!(
      api.url("/resources/4/toggle-upvote"),
      "https://campus.example/api/resources/4/toggle-upvote"
    );
    assert_eq!(
      api.url("study-groups"),
      "https://campus.example/api/study-groups"
    );
  }

  #[test]
  fn test_rejects_invalid_base_url() {
    let config = ApiConfig {
      base_url: "not a url".to_string(),
      timeout_secs: 5,
    };
    assert!(ApiClient::new(&config, Arc::new(MemoryStorage::new())).is_err());
  }

  #[test]
  fn test_token_read_from_storage() {
    let storage = Arc::new(MemoryStorage::new());
    let config = ApiConfig {
      base_url: "https://campus.example/api".to_string(),
      timeout_secs: 5,
    };
    let api = ApiClient::new(&config, storage.clone()).unwrap();
    assert_eq!(api.token(), None);

    storage.set_item(keys::AUTH_TOKEN, "secret").unwrap();
    assert_eq!(api.token().as_deref(), Some("secret"));

    storage.set_item(keys::AUTH_TOKEN, "").unwrap();
    assert_eq!(api.token(), None);
  }

  #[tokio::test]
  async fn test_unreachable_server_is_normalized() {
    // Port 9 (discard) on localhost is closed in test environments
    let api = client("http://127.0.0.1:9");
    let err = api
      .get::<Value>("/resources", &[])
      .await
      .unwrap_err();

    assert_eq!(err.status, None);
    assert_eq!(err.method, "GET");
    assert_eq!(err.url, "http://127.0.0.1:9/resources");
    assert!(!err.message.is_empty());
  }

  #[tokio::test]
  async fn test_stored_token_sent_as_bearer() {
    let server = StubServer::respond(200, r#"{"data":[]}"#).await;
    let storage = Arc::new(MemoryStorage::new());
    storage.set_item(keys::AUTH_TOKEN, "secret").unwrap();
    let config = ApiConfig {
      base_url: server.base_url().to_string(),
      timeout_secs: 5,
    };
    let api = ApiClient::new(&config, storage).unwrap();

    api.get::<Value>("/resources", &[]).await.unwrap();

    let request = server.request().await;
    assert!(request.starts_with("GET /api/resources HTTP/1.1"));
    let headers = request.to_ascii_lowercase();
    assert!(headers.contains("authorization: bearer secret\r\n"));
    assert!(headers.contains("accept: application/json\r\n"));
  }

  #[tokio::test]
  async fn test_no_authorization_header_without_token() {
    let server = StubServer::respond(200, "{}").await;
    let api = client(server.base_url());

    api.get::<Value>("/resources", &[]).await.unwrap();

    let request = server.request().await.to_ascii_lowercase();
    assert!(!request.contains("authorization:"));
  }

  #[tokio::test]
  async fn test_multipart_update_is_post_with_method_field() {
    let server = StubServer::respond(200, r#"{"data":{"id":4}}"#).await;
    let api = client(server.base_url());
    let form = Form::new().text("title", "Lab notes");

    let updated: Value = api.put_multipart("/resources/4", form).await.unwrap();
    assert_eq!(updated["data"]["id"], 4);

    let request = server.request().await;
    assert!(request.starts_with("POST /api/resources/4 HTTP/1.1"));
    assert!(request
      .to_ascii_lowercase()
      .contains("content-type: multipart/form-data"));
    assert!(request.contains("name=\"_method\"\r\n\r\nPUT\r\n"));
    assert!(request.contains("name=\"title\"\r\n\r\nLab notes\r\n"));
  }

  #[tokio::test]
  async fn test_server_error_message_taken_from_body() {
    let server = StubServer::respond(500, r#"{"message":"Server Error"}"#).await;
    let api = client(server.base_url());

    let err = api
      .post_empty::<Value>("/resources/4/toggle-upvote")
      .await
      .unwrap_err();

    assert_eq!(err.status, Some(500));
    assert_eq!(err.message, "Server Error");
    assert_eq!(err.method, "POST");
    assert_eq!(err.url, format!("{}/resources/4/toggle-upvote", server.base_url()));
    server.request().await;
  }

  #[tokio::test]
  async fn test_empty_success_body_decodes_as_null() {
    let server = StubServer::respond(200, "").await;
    let api = client(server.base_url());

    api.delete("/comments/3").await.unwrap();

    let request = server.request().await;
    assert!(request.starts_with("DELETE /api/comments/3 HTTP/1.1"));
  }
}
