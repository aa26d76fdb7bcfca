//! Domain types exchanged with the backend.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id: i64,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: Option<String>,
}

/// A shared study resource (notes, slides, past papers).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
  pub id: i64,
  pub title: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub user_id: Option<i64>,
  #[serde(default)]
  pub user: Option<User>,
  #[serde(default, alias = "upvotes_count")]
  pub upvote_count: u32,
  #[serde(default)]
  pub is_upvoted: bool,
  #[serde(default)]
  pub is_saved: bool,
  #[serde(default)]
  pub comments_count: u32,
  #[serde(default)]
  pub file_url: Option<String>,
  #[serde(default)]
  pub created_at: Option<String>,
  #[serde(default)]
  pub polls: Vec<Poll>,
}

impl Resource {
  pub fn author(&self) -> &str {
    self.user.as_ref().map(|u| u.name.as_str()).unwrap_or("")
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
  pub id: i64,
  #[serde(default)]
  pub resource_id: Option<i64>,
  pub user_id: i64,
  #[serde(default)]
  pub user: Option<User>,
  #[serde(alias = "content")]
  pub body: String,
  #[serde(default, alias = "upvotes_count")]
  pub upvote_count: u32,
  #[serde(default)]
  pub is_upvoted: bool,
  #[serde(default)]
  pub created_at: Option<String>,
  #[serde(default)]
  pub updated_at: Option<String>,
  /// Inserted locally, not yet confirmed by the server
  #[serde(skip)]
  pub pending: bool,
}

impl Comment {
  pub fn is_owned_by(&self, user_id: i64) -> bool {
    self.user_id == user_id
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollOption {
  pub id: i64,
  #[serde(alias = "option_text")]
  pub text: String,
  #[serde(default, alias = "votes")]
  pub votes_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poll {
  pub id: i64,
  pub question: String,
  #[serde(default)]
  pub options: Vec<PollOption>,
  /// Option the current user voted for
  #[serde(default, alias = "user_voted_option_id")]
  pub user_vote: Option<i64>,
}

impl Poll {
  pub fn total_votes(&self) -> u32 {
    self.options.iter().map(|o| o.votes_count).sum()
  }

  /// Share of the votes for an option, 0-100.
  pub fn percentage(&self, option_id: i64) -> f64 {
    let total = self.total_votes();
    if total == 0 {
      return 0.0;
    }
    self
      .options
      .iter()
      .find(|o| o.id == option_id)
      .map(|o| f64::from(o.votes_count) * 100.0 / f64::from(total))
      .unwrap_or(0.0)
  }

  pub fn option_mut(&mut self, option_id: i64) -> Option<&mut PollOption> {
    self.options.iter_mut().find(|o| o.id == option_id)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyGroup {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub course: Option<String>,
  #[serde(default)]
  pub members_count: u32,
  #[serde(default)]
  pub max_members: Option<u32>,
  #[serde(default)]
  pub is_member: bool,
}

/// A request to swap class sections with another student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRequest {
  pub id: i64,
  pub user_id: i64,
  #[serde(default)]
  pub course: String,
  #[serde(default)]
  pub current_section: Option<String>,
  #[serde(default)]
  pub desired_section: Option<String>,
  #[serde(default)]
  pub status: String,
  #[serde(default)]
  pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
  Pending,
  Accepted,
  Rejected,
  Withdrawn,
}

/// Someone's application to an exchange request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
  pub id: i64,
  pub request_id: i64,
  pub user_id: i64,
  pub status: ApplicationStatus,
  #[serde(default)]
  pub message: Option<String>,
}

/// A bookmarked resource. `resource` is empty when the resource was deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedItem {
  pub id: i64,
  pub resource_id: i64,
  #[serde(default)]
  pub resource: Option<Resource>,
  #[serde(default)]
  pub saved_at: Option<String>,
}

pub const UNAVAILABLE_PLACEHOLDER: &str = "This resource is no longer available";

impl SavedItem {
  pub fn is_available(&self) -> bool {
    self.resource.is_some()
  }

  pub fn title(&self) -> &str {
    self
      .resource
      .as_ref()
      .map(|r| r.title.as_str())
      .unwrap_or(UNAVAILABLE_PLACEHOLDER)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpvoteResponse {
  #[serde(alias = "upvotes_count")]
  pub upvote_count: u32,
  pub is_upvoted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveResponse {
  pub is_saved: bool,
}

/// What the server did with a poll vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
  /// First vote on this poll
  Recorded,
  /// Vote moved from another option
  Switched,
  /// Same option selected again, vote withdrawn
  Removed,
}

/// Prefix the server uses for withdrawn votes when it sends no status field.
const VOTE_REMOVED_PREFIX: &str = "Vote removed";

#[derive(Debug, Deserialize)]
pub(crate) struct ApiVoteResponse {
  #[serde(default)]
  status: Option<String>,
  #[serde(default)]
  message: Option<String>,
  #[serde(default)]
  poll: Option<Poll>,
  #[serde(default)]
  options: Option<Vec<PollOption>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoteResult {
  pub outcome: VoteOutcome,
  /// Authoritative counts, when the server sent them
  pub options: Option<Vec<PollOption>>,
}

impl From<ApiVoteResponse> for VoteResult {
  fn from(resp: ApiVoteResponse) -> Self {
    let from_status = resp
      .status
      .as_deref()
      .and_then(|s| match s.to_ascii_lowercase().as_str() {
        "removed" => Some(VoteOutcome::Removed),
        "switched" => Some(VoteOutcome::Switched),
        "recorded" | "voted" => Some(VoteOutcome::Recorded),
        _ => None,
      });

    let outcome = from_status.unwrap_or_else(|| {
      match resp.message.as_deref() {
        Some(m) if m.starts_with(VOTE_REMOVED_PREFIX) => VoteOutcome::Removed,
        _ => VoteOutcome::Recorded,
      }
    });

    VoteResult {
      outcome,
      options: resp.options.or_else(|| resp.poll.map(|p| p.options)),
    }
  }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
  #[serde(alias = "access_token")]
  pub token: String,
  #[serde(default)]
  pub user: Option<User>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn vote(value: serde_json::Value) -> VoteResult {
    serde_json::from_value::<ApiVoteResponse>(value)
      .unwrap()
      .into()
  }

  #[test]
  fn test_vote_outcome_from_status_field() {
    assert_eq!(
      vote(json!({"status": "switched"})).outcome,
      VoteOutcome::Switched
    );
    assert_eq!(
      vote(json!({"status": "REMOVED", "message": "ok"})).outcome,
      VoteOutcome::Removed
    );
  }

  #[test]
  fn test_vote_outcome_from_message_prefix() {
    assert_eq!(
      vote(json!({"message": "Vote removed successfully"})).outcome,
      VoteOutcome::Removed
    );
    assert_eq!(
      vote(json!({"message": "Vote recorded"})).outcome,
      VoteOutcome::Recorded
    );
    assert_eq!(vote(json!({})).outcome, VoteOutcome::Recorded);
  }

  #[test]
  fn test_vote_counts_from_nested_poll() {
    let result = vote(json!({
      "message": "Vote recorded",
      "poll": {
        "id": 1,
        "question": "Q",
        "options": [{"id": 10, "option_text": "A", "votes": 3}]
      }
    }));
    let options = result.options.unwrap();
    assert_eq!(options[0].text, "A");
    assert_eq!(options[0].votes_count, 3);
  }

  #[test]
  fn test_poll_percentage() {
    let poll = Poll {
      id: 1,
      question: "Q".into(),
      options: vec![
        PollOption {
          id: 1,
          text: "A".into(),
          votes_count: 1,
        },
        PollOption {
          id: 2,
          text: "B".into(),
          votes_count: 3,
        },
      ],
      user_vote: None,
    };
    assert_eq!(poll.percentage(1), 25.0);
    assert_eq!(poll.percentage(2), 75.0);
    assert_eq!(poll.percentage(99), 0.0);
  }

  #[test]
  fn test_saved_item_placeholder() {
    let item: SavedItem =
      serde_json::from_value(json!({"id": 1, "resource_id": 5, "resource": null})).unwrap();
    assert!(!item.is_available());
    assert_eq!(item.title(), UNAVAILABLE_PLACEHOLDER);
  }

  #[test]
  fn test_resource_defaults() {
    let resource: Resource = serde_json::from_value(json!({
      "id": 3,
      "title": "Thermo notes",
      "upvotes_count": 4,
      "user": {"id": 8, "name": "Sam"}
    }))
    .unwrap();
    assert_eq!(resource.upvote_count, 4);
    assert!(!resource.is_upvoted);
    assert_eq!(resource.author(), "Sam");
  }
}
