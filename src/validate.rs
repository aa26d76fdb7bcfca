//! Client-side input checks and the drafts they apply to.
//!
//! Anything rejected here is never sent to the server.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
  #[error("{0} is required")]
  Required(&'static str),

  #[error("A poll needs at least two options")]
  TooFewOptions,

  #[error("Poll option {0} has no text")]
  EmptyOption(usize),

  #[error("Either every poll option has a weight or none does")]
  PartialWeights,

  #[error("Poll option weights must add up to 100 (got {0})")]
  WeightTotal(u32),
}

/// Trimmed comment body, or an error if nothing is left.
pub fn comment_body(body: &str) -> Result<String, ValidationError> {
  let body = body.trim();
  if body.is_empty() {
    return Err(ValidationError::Required("Comment"));
  }
  Ok(body.to_string())
}

/// A resource being created or updated.
#[derive(Debug, Clone, Default)]
pub struct ResourceDraft {
  pub title: String,
  pub description: String,
  pub faculty_id: Option<i64>,
  pub major_id: Option<i64>,
  /// Local file to upload alongside the resource
  pub file: Option<PathBuf>,
}

impl ResourceDraft {
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.title.trim().is_empty() {
      return Err(ValidationError::Required("Title"));
    }
    if self.description.trim().is_empty() {
      return Err(ValidationError::Required("Description"));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PollOptionDraft {
  pub text: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub weight: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PollDraft {
  pub question: String,
  pub options: Vec<PollOptionDraft>,
}

impl PollDraft {
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.question.trim().is_empty() {
      return Err(ValidationError::Required("Question"));
    }
    if self.options.len() < 2 {
      return Err(ValidationError::TooFewOptions);
    }
    if let Some(index) = self.options.iter().position(|o| o.text.trim().is_empty()) {
      return Err(ValidationError::EmptyOption(index + 1));
    }

    let weighted = self.options.iter().filter(|o| o.weight.is_some()).count();
    if weighted == 0 {
      return Ok(());
    }
    if weighted != self.options.len() {
      return Err(ValidationError::PartialWeights);
    }

    let total: u32 = self.options.iter().filter_map(|o| o.weight).sum();
    if total != 100 {
      return Err(ValidationError::WeightTotal(total));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn option(text: &str, weight: Option<u32>) -> PollOptionDraft {
    PollOptionDraft {
      text: text.to_string(),
      weight,
    }
  }

  #[test]
  fn test_comment_body_trims() {
    assert_eq!(comment_body("  nice notes \n").unwrap(), "nice notes");
    assert_eq!(
      comment_body("   \t"),
      Err(ValidationError::Required("Comment"))
    );
  }

  #[test]
  fn test_resource_draft_requires_title_and_description() {
    let mut draft = ResourceDraft::default();
    assert_eq!(draft.validate(), Err(ValidationError::Required("Title")));

    draft.title = "Linear algebra notes".into();
    assert_eq!(
      draft.validate(),
      Err(ValidationError::Required("Description"))
    );

    draft.description = "Week 1-4".into();
    assert!(draft.validate().is_ok());
  }

  #[test]
  fn test_poll_without_weights() {
    let poll = PollDraft {
      question: "Best study spot?".into(),
      options: vec![option("Library", None), option("Cafe", None)],
    };
    assert!(poll.validate().is_ok());
  }

  #[test]
  fn test_poll_needs_two_options() {
    let poll = PollDraft {
      question: "Q".into(),
      options: vec![option("Only", None)],
    };
    assert_eq!(poll.validate(), Err(ValidationError::TooFewOptions));
  }

  #[test]
  fn test_poll_empty_option_is_reported_by_position() {
    let poll = PollDraft {
      question: "Q".into(),
      options: vec![option("A", None), option(" ", None)],
    };
    assert_eq!(poll.validate(), Err(ValidationError::EmptyOption(2)));
  }

  #[test]
  fn test_poll_weights_must_total_100() {
    let mut poll = PollDraft {
      question: "Grade split".into(),
      options: vec![option("Exam", Some(60)), option("Project", Some(30))],
    };
    assert_eq!(poll.validate(), Err(ValidationError::WeightTotal(90)));

    poll.options[1].weight = Some(40);
    assert!(poll.validate().is_ok());

    poll.options[1].weight = None;
    assert_eq!(poll.validate(), Err(ValidationError::PartialWeights));
  }
}
