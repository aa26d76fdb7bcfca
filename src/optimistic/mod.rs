//! Optimistic updates with exact rollback.
//!
//! A [`Mutation`] describes one user action against a piece of local state: how
//! to snapshot it, how to change it right away, how to fold in the server's
//! answer and how to undo it. [`Optimistic`] runs that lifecycle and makes sure
//! only one mutation per target key is in flight at a time.
//!
//! ```ignore
//! let optimistic = Optimistic::new();
//! let pending = optimistic.begin(ToggleUpvote::new(resource.id), &mut resource)?;
//! // resource already shows the new count; call the API...
//! let result = api.toggle_resource_upvote(resource.id).await;
//! pending.settle(&mut resource, result)?;
//! ```

mod in_flight;
mod mutations;

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::error::{ClientError, Result};

pub use in_flight::{InFlight, InFlightGuard};
pub use mutations::{
  AddComment, DeleteComment, EditComment, ToggleCommentUpvote, ToggleSave, ToggleUpvote, VotePoll,
};

/// One optimistic action against local state.
pub trait Mutation: Send + 'static {
  /// The local state being changed
  type Target;
  /// Whatever is needed to put the target back exactly as it was
  type Snapshot: Send + 'static;
  /// Server answer on success
  type Response: Send + 'static;

  /// Identifies the target for re-entrancy checks (e.g. `resource:12:upvote`).
  fn key(&self) -> String;

  fn capture(&self, target: &Self::Target) -> Self::Snapshot;

  fn apply(&self, target: &mut Self::Target);

  /// Overwrite local state with authoritative fields from the response.
  ///
  /// `snapshot` is the state before `apply`, for responses that only describe
  /// what the server did rather than the resulting values.
  fn reconcile(
    &self,
    target: &mut Self::Target,
    response: &Self::Response,
    snapshot: &Self::Snapshot,
  );

  fn revert(&self, target: &mut Self::Target, snapshot: Self::Snapshot);
}

/// Runs mutations and tracks which targets are busy.
#[derive(Clone, Default)]
pub struct Optimistic {
  in_flight: InFlight,
}

impl Optimistic {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn in_flight(&self) -> &InFlight {
    &self.in_flight
  }

  /// Capture and apply `mutation` to `target`.
  ///
  /// Fails with [`ClientError::Busy`] (leaving `target` untouched) if a mutation
  /// with the same key has not settled yet. The returned [`Pending`] holds the
  /// key until it is settled or dropped.
  pub fn begin<M: Mutation>(&self, mutation: M, target: &mut M::Target) -> Result<Pending<M>> {
    let key = mutation.key();
    let guard = self
      .in_flight
      .try_acquire(&key)
      .ok_or_else(|| ClientError::Busy(key.clone()))?;

    let snapshot = mutation.capture(target);
    mutation.apply(target);
    debug!("Applied optimistic update {}", key);

    Ok(Pending {
      mutation,
      snapshot,
      guard,
    })
  }

  /// Full lifecycle for a target behind a mutex: begin, call, settle.
  ///
  /// The lock is only held while touching the target, never across the call.
  pub async fn run<M, F, Fut>(
    &self,
    mutation: M,
    target: &Mutex<M::Target>,
    call: F,
  ) -> Result<M::Response>
  where
    M: Mutation,
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::result::Result<M::Response, ApiError>>,
  {
    let pending = {
      let mut target = target.lock().unwrap_or_else(PoisonError::into_inner);
      self.begin(mutation, &mut target)?
    };

    let result = call().await;

    let mut target = target.lock().unwrap_or_else(PoisonError::into_inner);
    pending.settle(&mut target, result)
  }
}

/// An applied mutation waiting for its server response.
pub struct Pending<M: Mutation> {
  mutation: M,
  snapshot: M::Snapshot,
  guard: InFlightGuard,
}

impl<M: Mutation> Pending<M> {
  pub fn key(&self) -> &str {
    self.guard.key()
  }

  pub fn mutation(&self) -> &M {
    &self.mutation
  }

  /// Reconcile on success, restore the snapshot on failure. Releases the key.
  pub fn settle(
    self,
    target: &mut M::Target,
    result: std::result::Result<M::Response, ApiError>,
  ) -> Result<M::Response> {
    let Pending {
      mutation,
      snapshot,
      guard,
    } = self;

    let outcome = match result {
      Ok(response) => {
        mutation.reconcile(target, &response, &snapshot);
        debug!("Reconciled {}", guard.key());
        Ok(response)
      }
      Err(err) => {
        mutation.revert(target, snapshot);
        warn!("Reverted {}: {}", guard.key(), err);
        Err(ClientError::from_api(err))
      }
    };

    drop(guard);
    outcome
  }
}

impl<M: Mutation> std::fmt::Debug for Pending<M> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Pending")
      .field("key", &self.guard.key())
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::{Resource, UpvoteResponse};
  use reqwest::Method;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;

  fn resource(upvote_count: u32, is_upvoted: bool) -> Resource {
    Resource {
      id: 1,
      title: "Discrete maths past papers".into(),
      description: None,
      user_id: Some(2),
      user: None,
      upvote_count,
      is_upvoted,
      is_saved: false,
      comments_count: 0,
      file_url: None,
      created_at: None,
      polls: Vec::new(),
    }
  }

  fn server_error() -> ApiError {
    ApiError::from_response(
      500,
      r#"{"message":"Server Error"}"#,
      "https://api.test/resources/1/toggle-upvote",
      &Method::POST,
    )
  }

  #[tokio::test]
  async fn test_upvote_reconciles_with_server_count() {
    let optimistic = Optimistic::new();
    let target = Mutex::new(resource(3, false));
    let observed = &target;

    let result = optimistic
      .run(ToggleUpvote::new(1), &target, move || async move {
        // Local state is already updated while the call is in flight
        let current = observed.lock().unwrap().clone();
        assert_eq!((current.upvote_count, current.is_upvoted), (4, true));

        Ok(UpvoteResponse {
          upvote_count: 5,
          is_upvoted: true,
        })
      })
      .await;

    assert!(result.is_ok());
    let after = target.lock().unwrap().clone();
    assert_eq!((after.upvote_count, after.is_upvoted), (5, true));
    assert!(optimistic.in_flight().is_empty());
  }

  #[tokio::test]
  async fn test_upvote_failure_restores_exact_value() {
    let optimistic = Optimistic::new();
    let before = resource(3, false);
    let target = Mutex::new(before.clone());

    let err = optimistic
      .run(ToggleUpvote::new(1), &target, || async { Err(server_error()) })
      .await
      .unwrap_err();

    assert_eq!(*target.lock().unwrap(), before);
    assert!(err.has_status(500));
    assert_eq!(err.to_string(), "Server Error");
    assert!(optimistic.in_flight().is_empty());
  }

  #[test]
  fn test_second_trigger_before_settle_is_rejected() {
    let optimistic = Optimistic::new();
    let mut target = resource(3, false);
    let calls = AtomicU32::new(0);

    let trigger = |target: &mut Resource| -> Option<Pending<ToggleUpvote>> {
      let pending = optimistic.begin(ToggleUpvote::new(1), target).ok()?;
      calls.fetch_add(1, Ordering::SeqCst);
      Some(pending)
    };

    let first = trigger(&mut target);
    let second = trigger(&mut target);

    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    // Second trigger did not flip the flag back
    assert_eq!((target.upvote_count, target.is_upvoted), (4, true));

    first
      .unwrap()
      .settle(
        &mut target,
        Ok(UpvoteResponse {
          upvote_count: 4,
          is_upvoted: true,
        }),
      )
      .unwrap();
    assert!(optimistic.begin(ToggleUpvote::new(1), &mut target).is_ok());
  }

  #[tokio::test]
  async fn test_concurrent_runs_issue_one_call() {
    let optimistic = Optimistic::new();
    let target = Arc::new(Mutex::new(resource(0, false)));
    let calls = Arc::new(AtomicU32::new(0));
    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

    let first = {
      let optimistic = optimistic.clone();
      let target = target.clone();
      let calls = calls.clone();
      tokio::spawn(async move {
        optimistic
          .run(ToggleUpvote::new(1), &target, || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            let _ = release_rx.await;
            Ok(UpvoteResponse {
              upvote_count: 1,
              is_upvoted: true,
            })
          })
          .await
      })
    };

    // Wait until the first mutation holds the key
    while !optimistic.in_flight().is_pending("resource:1:upvote") {
      tokio::task::yield_now().await;
    }

    let calls_second = calls.clone();
    let second = optimistic
      .run(ToggleUpvote::new(1), &target, || async move {
        calls_second.fetch_add(1, Ordering::SeqCst);
        Ok(UpvoteResponse {
          upvote_count: 0,
          is_upvoted: false,
        })
      })
      .await;

    assert!(matches!(second, Err(ClientError::Busy(_))));

    release_tx.send(()).unwrap();
    first.await.unwrap().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn test_dropped_pending_releases_key() {
    let optimistic = Optimistic::new();
    let mut target = resource(0, false);

    let pending = optimistic.begin(ToggleUpvote::new(1), &mut target).unwrap();
    assert_eq!(pending.key(), "resource:1:upvote");
    drop(pending);

    assert!(optimistic.in_flight().is_empty());
  }

  #[test]
  fn test_expired_session_reverts_and_asks_for_login() {
    let optimistic = Optimistic::new();
    let before = resource(3, false);
    let mut target = before.clone();

    let pending = optimistic.begin(ToggleUpvote::new(1), &mut target).unwrap();
    let unauthorized = ApiError::from_response(
      401,
      r#"{"message":"Unauthenticated."}"#,
      "https://api.test/resources/1/toggle-upvote",
      &Method::POST,
    );
    let err = pending.settle(&mut target, Err(unauthorized)).unwrap_err();

    assert_eq!(err, ClientError::NotAuthenticated);
    assert_eq!(target, before);
    assert!(optimistic.in_flight().is_empty());
  }
}
