//! Errors surfaced by client operations.

use thiserror::Error;

use crate::api::ApiError;
use crate::validate::ValidationError;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Everything a user-initiated action can fail with.
///
/// Each variant's `Display` is the human-readable text shown in a notification.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
  /// The server rejected the request or could not be reached
  #[error(transparent)]
  Api(#[from] ApiError),

  /// Input was rejected before anything was sent
  #[error(transparent)]
  Validation(#[from] ValidationError),

  /// Another update to the same target has not settled yet
  #[error("Still working on the previous change, try again in a moment")]
  Busy(String),

  /// The acting user does not own the record
  #[error("You can only change your own {0}")]
  NotOwner(&'static str),

  /// The server answered 401; the stored token is missing or expired
  #[error("You need to log in first")]
  NotAuthenticated,

  #[error("Could not read {path}: {message}")]
  File { path: String, message: String },

  #[error("Storage error: {0}")]
  Storage(String),
}

impl ClientError {
  pub fn storage(err: impl std::fmt::Display) -> Self {
    Self::Storage(err.to_string())
  }

  /// Like `From<ApiError>`, but a 401 becomes [`ClientError::NotAuthenticated`].
  pub fn from_api(err: ApiError) -> Self {
    if err.is_unauthorized() {
      Self::NotAuthenticated
    } else {
      Self::Api(err)
    }
  }

  /// Whether this error came from a server response with the given status.
  pub fn has_status(&self, status: u16) -> bool {
    match self {
      Self::Api(e) => e.status == Some(status),
      Self::NotAuthenticated => status == 401,
      _ => false,
    }
  }
}
