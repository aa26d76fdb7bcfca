//! Normalized HTTP failure.

use reqwest::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;

/// The single error shape every failed request is turned into.
///
/// Callers only ever see `message` (for display), `status` (if the server
/// answered), the decoded body in `data`, and which request failed.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ApiError {
  pub message: String,
  pub status: Option<u16>,
  pub data: Option<Value>,
  pub url: String,
  pub method: String,
}

impl ApiError {
  /// Build an error from a non-success response.
  ///
  /// The message comes from the body's `message` or `error` field when the body
  /// is JSON, otherwise from the status reason phrase.
  pub fn from_response(status: u16, body: &str, url: &str, method: &Method) -> Self {
    let data = serde_json::from_str::<Value>(body).ok();

    let message = data
      .as_ref()
      .and_then(message_from_body)
      .or_else(|| {
        StatusCode::from_u16(status)
          .ok()
          .and_then(|s| s.canonical_reason())
          .map(String::from)
      })
      .unwrap_or_else(|| format!("Request failed with status {}", status));

    Self {
      message,
      status: Some(status),
      data: data.or_else(|| (!body.is_empty()).then(|| Value::String(body.to_string()))),
      url: url.to_string(),
      method: method.to_string(),
    }
  }

  /// Build an error for a request that never got a response.
  pub fn from_transport(err: &reqwest::Error, url: &str, method: &Method) -> Self {
    let message = if err.is_timeout() {
      "The server took too long to respond".to_string()
    } else if err.is_connect() {
      "Could not reach the server".to_string()
    } else {
      err.to_string()
    };

    Self {
      message,
      status: err.status().map(|s| s.as_u16()),
      data: None,
      url: url.to_string(),
      method: method.to_string(),
    }
  }

  /// A response arrived but could not be understood.
  pub fn invalid_response(err: impl std::fmt::Display, url: &str, method: &Method) -> Self {
    Self {
      message: format!("Unexpected response from server: {}", err),
      status: None,
      data: None,
      url: url.to_string(),
      method: method.to_string(),
    }
  }

  /// The request could not be built (bad path, bad base URL).
  pub fn invalid_request(err: impl std::fmt::Display, url: &str, method: &Method) -> Self {
    Self {
      message: format!("Invalid request: {}", err),
      status: None,
      data: None,
      url: url.to_string(),
      method: method.to_string(),
    }
  }

  pub fn is_not_found(&self) -> bool {
    self.status == Some(404)
  }

  pub fn is_unauthorized(&self) -> bool {
    self.status == Some(401)
  }
}

fn message_from_body(body: &Value) -> Option<String> {
  ["message", "error"]
    .iter()
    .find_map(|field| body.get(field).and_then(Value::as_str))
    .filter(|m| !m.trim().is_empty())
    .map(String::from)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_message_from_json_body() {
    let err = ApiError::from_response(
      422,
      r#"{"message":"The title field is required.","errors":{"title":["required"]}}"#,
      "https://api.test/resources",
      &Method::POST,
    );

    assert_eq!(err.message, "The title field is required.");
    assert_eq!(err.status, Some(422));
    assert_eq!(err.method, "POST");
    assert_eq!(err.url, "https://api.test/resources");
    assert_eq!(err.data.unwrap()["errors"]["title"][0], json!("required"));
  }

  #[test]
  fn test_error_field_fallback() {
    let err = ApiError::from_response(
      403,
      r#"{"error":"Forbidden for this user"}"#,
      "u",
      &Method::DELETE,
    );
    assert_eq!(err.message, "Forbidden for this user");
  }

  #[test]
  fn test_reason_phrase_when_body_is_not_json() {
    let err = ApiError::from_response(500, "<html>oops</html>", "u", &Method::GET);
    assert_eq!(err.message, "Internal Server Error");
    assert_eq!(err.data, Some(json!("<html>oops</html>")));
  }

  #[test]
  fn test_empty_body() {
    let err = ApiError::from_response(404, "", "u", &Method::GET);
    assert_eq!(err.message, "Not Found");
    assert_eq!(err.data, None);
    assert!(err.is_not_found());
  }

  #[test]
  fn test_display_is_message() {
    let err = ApiError::from_response(401, r#"{"message":"Unauthenticated."}"#, "u", &Method::GET);
    assert_eq!(err.to_string(), "Unauthenticated.");
    assert!(err.is_unauthorized());
  }
}
