//! Login and session token handling.

use serde_json::json;
use tracing::info;

use super::client::ApiClient;
use super::error::ApiError;
use super::page::Single;
use super::types::{LoginResponse, User};
use crate::error::{ClientError, Result};
use crate::storage::keys;
use crate::validate::ValidationError;

impl ApiClient {
  /// Exchange credentials for a token and store it for later requests.
  pub async fn login(&self, email: &str, password: &str) -> Result<Option<User>> {
    if email.trim().is_empty() {
      return Err(ValidationError::Required("Email").into());
    }
    if password.is_empty() {
      return Err(ValidationError::Required("Password").into());
    }

    let response: LoginResponse = self
      .post(
        "/login",
        &json!({ "email": email.trim(), "password": password }),
      )
      .await?;

    self
      .storage()
      .set_item(keys::AUTH_TOKEN, &response.token)
      .map_err(ClientError::storage)?;
    info!("Logged in as {}", email.trim());

    Ok(response.user)
  }

  /// Forget the stored token.
  pub fn logout(&self) -> Result<()> {
    self
      .storage()
      .remove_item(keys::AUTH_TOKEN)
      .map_err(ClientError::storage)
  }

  pub fn is_authenticated(&self) -> bool {
    matches!(self.storage().get_item(keys::AUTH_TOKEN), Ok(Some(t)) if !t.is_empty())
  }

  pub async fn current_user(&self) -> std::result::Result<User, ApiError> {
    let user: Single<User> = self.get("/user", &[]).await?;
    Ok(user.into_inner())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ApiConfig;
  use crate::storage::{LocalStorage, MemoryStorage};
  use std::sync::Arc;

  fn client(storage: Arc<MemoryStorage>) -> ApiClient {
    let config = ApiConfig {
      base_url: "http://127.0.0.1:9".to_string(),
      timeout_secs: 5,
    };
    ApiClient::new(&config, storage).unwrap()
  }

  #[tokio::test]
  async fn test_login_validates_before_sending() {
    let api = client(Arc::new(MemoryStorage::new()));

    let err = api.login("  ", "pw").await.unwrap_err();
    assert_eq!(err, ClientError::Validation(ValidationError::Required("Email")));

    let err = api.login("a@uni.edu", "").await.unwrap_err();
    assert_eq!(
      err,
      ClientError::Validation(ValidationError::Required("Password"))
    );
  }

  #[test]
  fn test_logout_clears_token() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set_item(keys::AUTH_TOKEN, "t").unwrap();
    let api = client(storage.clone());
    assert!(api.is_authenticated());

    api.logout().unwrap();
    assert!(!api.is_authenticated());
    assert_eq!(storage.get_item(keys::AUTH_TOKEN).unwrap(), None);
  }
}
