//! Difficulty distribution over categorical labels.

use serde::Serialize;

use crate::domain::{Difficulty, Problem};
use crate::util::percentage;

pub const UNCLASSIFIED: &str = "unclassified";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DifficultyShare {
  pub label: &'static str,
  pub count: usize,
  pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DifficultyDistribution {
  pub total: usize,
  /// easy, medium, hard, unclassified; zero-count labels included.
  pub shares: Vec<DifficultyShare>,
}

/// Count problems per label. Unlabelled problems are reported under
/// `unclassified` and are part of the percentage denominator.
pub fn compute_difficulty_distribution(problems: &[Problem]) -> DifficultyDistribution {
  // One slot per label plus the trailing unclassified slot.
  let mut counts = [0usize; 4];
  for problem in problems {
    let slot = match problem.difficulty {
      Some(label) => Difficulty::ALL.iter().position(|d| *d == label).unwrap_or(Difficulty::ALL.len()),
      None => Difficulty::ALL.len(),
    };
    counts[slot] += 1;
  }

  let total = problems.len();
  let labels = Difficulty::ALL.iter().map(Difficulty::as_str).chain(std::iter::once(UNCLASSIFIED));
  let shares = labels
    .zip(counts)
    .map(|(label, count)| DifficultyShare { label, count, percentage: percentage(count, total) })
    .collect();

  DifficultyDistribution { total, shares }
}
