//! Domain models: problems, attempts and their outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Categorical difficulty label, distinct from the numeric rating.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  #[serde(alias = "Easy")]
  Easy,
  #[serde(alias = "Medium")]
  Medium,
  #[serde(alias = "Hard")]
  Hard,
}

impl Difficulty {
  pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }
}

/// How an attempt ended. Only `Solved` is terminal.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  Solved,
  Attempted,
  /// Candidate for abandonment; the detector decides based on staleness.
  Abandoned,
}

impl Outcome {
  pub fn is_solved(&self) -> bool { matches!(self, Outcome::Solved) }
}

/// Problem metadata as served by the data source.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Problem {
  pub id: String,
  #[serde(default)] pub rating: Option<f64>,
  #[serde(default)] pub tags: Vec<String>,
  #[serde(default)] pub difficulty: Option<Difficulty>,
}

impl Problem {
  pub fn has_any_tag(&self, wanted: &[String]) -> bool {
    self.tags.iter().any(|t| wanted.iter().any(|w| w == t))
  }
}

/// One attempt record. Several records may exist per (user, problem) pair.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Attempt {
  pub user_id: String,
  pub problem_id: String,
  pub timestamp: DateTime<Utc>,
  pub outcome: Outcome,
}
