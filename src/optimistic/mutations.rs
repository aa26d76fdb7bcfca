//! Concrete mutations for resources, comments and polls.

use std::sync::atomic::{AtomicI64, Ordering};

use super::Mutation;
use crate::api::types::{
  Comment, Poll, Resource, SaveResponse, UpvoteResponse, User, VoteOutcome, VoteResult,
};
use crate::error::{ClientError, Result};
use crate::validate;

/// Flip the current user's upvote on a resource.
#[derive(Debug, Clone, Copy)]
pub struct ToggleUpvote {
  resource_id: i64,
}

impl ToggleUpvote {
  pub fn new(resource_id: i64) -> Self {
    Self { resource_id }
  }

  pub fn resource_id(&self) -> i64 {
    self.resource_id
  }
}

impl Mutation for ToggleUpvote {
  type Target = Resource;
  type Snapshot = (u32, bool);
  type Response = UpvoteResponse;

  fn key(&self) -> String {
    format!("resource:{}:upvote", self.resource_id)
  }

  fn capture(&self, target: &Resource) -> (u32, bool) {
    (target.upvote_count, target.is_upvoted)
  }

  fn apply(&self, target: &mut Resource) {
    flip_upvote(&mut target.upvote_count, &mut target.is_upvoted);
  }

  fn reconcile(
    &self,
    target: &mut Resource,
    response: &UpvoteResponse,
    _snapshot: &Self::Snapshot,
  ) {
    target.upvote_count = response.upvote_count;
    target.is_upvoted = response.is_upvoted;
  }

  fn revert(&self, target: &mut Resource, (count, upvoted): (u32, bool)) {
    target.upvote_count = count;
    target.is_upvoted = upvoted;
  }
}

/// Save or unsave (bookmark) a resource.
#[derive(Debug, Clone, Copy)]
pub struct ToggleSave {
  resource_id: i64,
}

impl ToggleSave {
  pub fn new(resource_id: i64) -> Self {
    Self { resource_id }
  }

  pub fn resource_id(&self) -> i64 {
    self.resource_id
  }
}

impl Mutation for ToggleSave {
  type Target = Resource;
  type Snapshot = bool;
  type Response = SaveResponse;

  fn key(&self) -> String {
    format!("resource:{}:save", self.resource_id)
  }

  fn capture(&self, target: &Resource) -> bool {
    target.is_saved
  }

  fn apply(&self, target: &mut Resource) {
    target.is_saved = !target.is_saved;
  }

  fn reconcile(
    &self,
    target: &mut Resource,
    response: &SaveResponse,
    _snapshot: &Self::Snapshot,
  ) {
    target.is_saved = response.is_saved;
  }

  fn revert(&self, target: &mut Resource, saved: bool) {
    target.is_saved = saved;
  }
}

/// Flip the current user's upvote on one comment in a list.
#[derive(Debug, Clone, Copy)]
pub struct ToggleCommentUpvote {
  comment_id: i64,
}

impl ToggleCommentUpvote {
  pub fn new(comment_id: i64) -> Self {
    Self { comment_id }
  }
}

impl Mutation for ToggleCommentUpvote {
  type Target = Vec<Comment>;
  type Snapshot = Option<(u32, bool)>;
  type Response = UpvoteResponse;

  fn key(&self) -> String {
    format!("comment:{}:upvote", self.comment_id)
  }

  fn capture(&self, target: &Vec<Comment>) -> Option<(u32, bool)> {
    find(target, self.comment_id).map(|c| (c.upvote_count, c.is_upvoted))
  }

  fn apply(&self, target: &mut Vec<Comment>) {
    if let Some(c) = find_mut(target, self.comment_id) {
      flip_upvote(&mut c.upvote_count, &mut c.is_upvoted);
    }
  }

  fn reconcile(
    &self,
    target: &mut Vec<Comment>,
    response: &UpvoteResponse,
    _snapshot: &Self::Snapshot,
  ) {
    if let Some(c) = find_mut(target, self.comment_id) {
      c.upvote_count = response.upvote_count;
      c.is_upvoted = response.is_upvoted;
    }
  }

  fn revert(&self, target: &mut Vec<Comment>, snapshot: Option<(u32, bool)>) {
    if let (Some(c), Some((count, upvoted))) = (find_mut(target, self.comment_id), snapshot) {
      c.upvote_count = count;
      c.is_upvoted = upvoted;
    }
  }
}

// Locally inserted comments get negative ids until the server assigns one
static NEXT_TEMP_ID: AtomicI64 = AtomicI64::new(-1);

/// Post a new comment, shown at the top of the list immediately.
#[derive(Debug, Clone)]
pub struct AddComment {
  resource_id: i64,
  temp_id: i64,
  author: User,
  body: String,
}

impl AddComment {
  /// Fails with a validation error for an empty body.
  pub fn new(resource_id: i64, author: User, body: &str) -> Result<Self> {
    let body = validate::comment_body(body)?;
    Ok(Self {
      resource_id,
      temp_id: NEXT_TEMP_ID.fetch_sub(1, Ordering::Relaxed),
      author,
      body,
    })
  }

  pub fn resource_id(&self) -> i64 {
    self.resource_id
  }

  pub fn body(&self) -> &str {
    &self.body
  }

  pub fn temp_id(&self) -> i64 {
    self.temp_id
  }
}

impl Mutation for AddComment {
  type Target = Vec<Comment>;
  type Snapshot = ();
  type Response = Comment;

  fn key(&self) -> String {
    format!("resource:{}:comment:add", self.resource_id)
  }

  fn capture(&self, _target: &Vec<Comment>) {}

  fn apply(&self, target: &mut Vec<Comment>) {
    target.insert(
      0,
      Comment {
        id: self.temp_id,
        resource_id: Some(self.resource_id),
        user_id: self.author.id,
        user: Some(self.author.clone()),
        body: self.body.clone(),
        upvote_count: 0,
        is_upvoted: false,
        created_at: None,
        updated_at: None,
        pending: true,
      },
    );
  }

  fn reconcile(
    &self,
    target: &mut Vec<Comment>,
    response: &Comment,
    _snapshot: &Self::Snapshot,
  ) {
    if let Some(c) = find_mut(target, self.temp_id) {
      *c = response.clone();
      c.pending = false;
    }
  }

  fn revert(&self, target: &mut Vec<Comment>, _snapshot: ()) {
    target.retain(|c| c.id != self.temp_id);
  }
}

/// Change the text of one of the acting user's comments.
#[derive(Debug, Clone)]
pub struct EditComment {
  comment_id: i64,
  body: String,
}

impl EditComment {
  /// Fails if `acting_user_id` does not own `comment` or the new body is empty.
  pub fn new(comment: &Comment, acting_user_id: i64, body: &str) -> Result<Self> {
    if !comment.is_owned_by(acting_user_id) {
      return Err(ClientError::NotOwner("comments"));
    }
    let body = validate::comment_body(body)?;
    Ok(Self {
      comment_id: comment.id,
      body,
    })
  }

  pub fn comment_id(&self) -> i64 {
    self.comment_id
  }

  pub fn body(&self) -> &str {
    &self.body
  }
}

impl Mutation for EditComment {
  type Target = Vec<Comment>;
  type Snapshot = Option<(String, Option<String>)>;
  type Response = Comment;

  fn key(&self) -> String {
    format!("comment:{}", self.comment_id)
  }

  fn capture(&self, target: &Vec<Comment>) -> Self::Snapshot {
    find(target, self.comment_id).map(|c| (c.body.clone(), c.updated_at.clone()))
  }

  fn apply(&self, target: &mut Vec<Comment>) {
    if let Some(c) = find_mut(target, self.comment_id) {
      c.body = self.body.clone();
    }
  }

  fn reconcile(
    &self,
    target: &mut Vec<Comment>,
    response: &Comment,
    _snapshot: &Self::Snapshot,
  ) {
    if let Some(c) = find_mut(target, self.comment_id) {
      c.body = response.body.clone();
      c.updated_at = response.updated_at.clone();
    }
  }

  fn revert(&self, target: &mut Vec<Comment>, snapshot: Self::Snapshot) {
    if let (Some(c), Some((body, updated_at))) = (find_mut(target, self.comment_id), snapshot) {
      c.body = body;
      c.updated_at = updated_at;
    }
  }
}

/// Remove one of the acting user's comments.
#[derive(Debug, Clone, Copy)]
pub struct DeleteComment {
  comment_id: i64,
}

impl DeleteComment {
  /// Fails if `acting_user_id` does not own `comment`.
  pub fn new(comment: &Comment, acting_user_id: i64) -> Result<Self> {
    if !comment.is_owned_by(acting_user_id) {
      return Err(ClientError::NotOwner("comments"));
    }
    Ok(Self {
      comment_id: comment.id,
    })
  }

  pub fn comment_id(&self) -> i64 {
    self.comment_id
  }
}

impl Mutation for DeleteComment {
  type Target = Vec<Comment>;
  /// Position and content of the removed comment
  type Snapshot = Option<(usize, Comment)>;
  type Response = ();

  fn key(&self) -> String {
    format!("comment:{}", self.comment_id)
  }

  fn capture(&self, target: &Vec<Comment>) -> Self::Snapshot {
    target
      .iter()
      .position(|c| c.id == self.comment_id)
      .map(|index| (index, target[index].clone()))
  }

  fn apply(&self, target: &mut Vec<Comment>) {
    target.retain(|c| c.id != self.comment_id);
  }

  fn reconcile(
    &self,
    _target: &mut Vec<Comment>,
    _response: &(),
    _snapshot: &Self::Snapshot,
  ) {}

  fn revert(&self, target: &mut Vec<Comment>, snapshot: Self::Snapshot) {
    if let Some((index, comment)) = snapshot {
      if find(target, comment.id).is_none() {
        let index = index.min(target.len());
        target.insert(index, comment);
      }
    }
  }
}

/// Vote on a poll option.
///
/// Picking the option already chosen withdraws the vote; picking another one
/// moves it. Percentages are derived from counts, so both the old and the new
/// option change on screen.
#[derive(Debug, Clone, Copy)]
pub struct VotePoll {
  poll_id: i64,
  option_id: i64,
}

impl VotePoll {
  pub fn new(poll_id: i64, option_id: i64) -> Self {
    Self { poll_id, option_id }
  }

  pub fn option_id(&self) -> i64 {
    self.option_id
  }
}

impl Mutation for VotePoll {
  type Target = Poll;
  type Snapshot = Poll;
  type Response = VoteResult;

  fn key(&self) -> String {
    format!("poll:{}:vote", self.poll_id)
  }

  fn capture(&self, target: &Poll) -> Poll {
    target.clone()
  }

  fn apply(&self, target: &mut Poll) {
    match target.user_vote {
      Some(current) if current == self.option_id => {
        decrement(target, current);
        target.user_vote = None;
      }
      Some(previous) => {
        decrement(target, previous);
        increment(target, self.option_id);
        target.user_vote = Some(self.option_id);
      }
      None => {
        increment(target, self.option_id);
        target.user_vote = Some(self.option_id);
      }
    }
  }

  fn reconcile(
    &self,
    target: &mut Poll,
    response: &VoteResult,
    snapshot: &Poll,
  ) {
    if let Some(options) = &response.options {
      for option in options {
        if let Some(local) = target.option_mut(option.id) {
          local.votes_count = option.votes_count;
        }
      }
      target.user_vote = match response.outcome {
        VoteOutcome::Removed => None,
        VoteOutcome::Recorded | VoteOutcome::Switched => Some(self.option_id),
      };
      return;
    }

    // No counts from the server: replay its outcome over the pre-vote state
    *target = snapshot.clone();
    match response.outcome {
      VoteOutcome::Removed => {
        decrement(target, self.option_id);
        target.user_vote = None;
      }
      VoteOutcome::Recorded | VoteOutcome::Switched => {
        match snapshot.user_vote {
          Some(current) if current == self.option_id => {}
          Some(previous) => {
            decrement(target, previous);
            increment(target, self.option_id);
          }
          None => increment(target, self.option_id),
        }
        target.user_vote = Some(self.option_id);
      }
    }
  }

  fn revert(&self, target: &mut Poll, snapshot: Poll) {
    *target = snapshot;
  }
}

fn flip_upvote(count: &mut u32, upvoted: &mut bool) {
  if *upvoted {
    *count = count.saturating_sub(1);
  } else {
    *count += 1;
  }
  *upvoted = !*upvoted;
}

fn increment(poll: &mut Poll, option_id: i64) {
  if let Some(option) = poll.option_mut(option_id) {
    option.votes_count += 1;
  }
}

fn decrement(poll: &mut Poll, option_id: i64) {
  if let Some(option) = poll.option_mut(option_id) {
    option.votes_count = option.votes_count.saturating_sub(1);
  }
}

fn find(comments: &[Comment], id: i64) -> Option<&Comment> {
  comments.iter().find(|c| c.id == id)
}

fn find_mut(comments: &mut [Comment], id: i64) -> Option<&mut Comment> {
  comments.iter_mut().find(|c| c.id == id)
}
