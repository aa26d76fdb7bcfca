//! Poll endpoints.

use super::client::ApiClient;
use super::error::ApiError;
use super::page::Single;
use super::types::{ApiVoteResponse, Poll, VoteResult};
use crate::error::Result;
use crate::validate::PollDraft;

impl ApiClient {
  /// Attach a poll to a resource. The draft is validated before sending.
  pub async fn create_poll(&self, resource_id: i64, draft: &PollDraft) -> Result<Poll> {
    draft.validate()?;
    let created: Single<Poll> = self
      .post(&format!("/resources/{}/polls", resource_id), draft)
      .await?;
    Ok(created.into_inner())
  }

  /// Vote for an option. Voting for the option already chosen withdraws the vote.
  pub async fn vote_poll_option(&self, option_id: i64) -> std::result::Result<VoteResult, ApiError> {
    let response: ApiVoteResponse = self
      .post_empty(&format!("/poll-options/{}/vote", option_id))
      .await?;
    Ok(response.into())
  }
}
