//! Tag mastery: per-tag solve ratios and the "weak tags" ranking.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::domain::{Attempt, Problem};
use crate::metrics::status::current_status;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TagStat {
  pub tag: String,
  /// Distinct (user, problem) pairs touching this tag.
  pub attempts: usize,
  pub solved: usize,
  /// `1 - solved / attempts`; higher means less mastery.
  pub weakness: f64,
}

/// Inventory entry for a tag across the problem set.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TagInfo {
  pub tag: String,
  pub problem_count: usize,
  pub attempted: usize,
  pub solved: usize,
}

fn index_problems(problems: &[Problem]) -> HashMap<&str, &Problem> {
  problems.iter().map(|p| (p.id.as_str(), p)).collect()
}

/// Unique, non-empty tags of a problem in label order.
fn tag_set(problem: &Problem) -> BTreeSet<&str> {
  problem
    .tags
    .iter()
    .map(|t| t.trim())
    .filter(|t| !t.is_empty())
    .collect()
}

/// (attempted pairs, solved pairs) per tag, counted once per (user, problem).
fn tally_tags<'a>(
  attempts: &[Attempt],
  by_id: &HashMap<&str, &'a Problem>,
) -> BTreeMap<&'a str, (usize, usize)> {
  let mut tally: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
  for latest in current_status(attempts) {
    // Attempts on problems outside the snapshot carry no tags.
    let Some(&problem) = by_id.get(latest.problem_id.as_str()) else {
      continue;
    };
    let solved = latest.outcome.is_solved();
    for tag in tag_set(problem) {
      let entry = tally.entry(tag).or_default();
      entry.0 += 1;
      if solved {
        entry.1 += 1;
      }
    }
  }
  tally
}

/// Rank tags by weakness, weakest first. Ties go to the tag with more
/// attempts, then to the alphabetically smaller label. `top_n` of `None` or
/// anything `<= 0` returns the whole ranking.
pub fn compute_weak_tags(attempts: &[Attempt], problems: &[Problem], top_n: Option<i64>) -> Vec<TagStat> {
  let by_id = index_problems(problems);
  let mut ranked: Vec<TagStat> = tally_tags(attempts, &by_id)
    .into_iter()
    .filter(|(_, (attempted, _))| *attempted > 0)
    .map(|(tag, (attempted, solved))| TagStat {
      tag: tag.to_string(),
      attempts: attempted,
      solved,
      weakness: 1.0 - solved as f64 / attempted as f64,
    })
    .collect();

  ranked.sort_by(|a, b| {
    b.weakness
      .total_cmp(&a.weakness)
      .then_with(|| b.attempts.cmp(&a.attempts))
      .then_with(|| a.tag.cmp(&b.tag))
  });

  if let Some(n) = top_n.filter(|n| *n > 0) {
    ranked.truncate(usize::try_from(n).unwrap_or(usize::MAX));
  }
  debug!(target: "metrics", tags = ranked.len(), ?top_n, "weak tags ranked");
  ranked
}

/// Every tag in the problem set with its problem count and how many distinct
/// (user, problem) pairs attempted and solved it. Most common tags first.
pub fn compute_tag_overview(problems: &[Problem], attempts: &[Attempt]) -> Vec<TagInfo> {
  let by_id = index_problems(problems);
  let tally = tally_tags(attempts, &by_id);

  let mut problem_counts: BTreeMap<&str, usize> = BTreeMap::new();
  for problem in by_id.values() {
    for tag in tag_set(problem) {
      *problem_counts.entry(tag).or_insert(0) += 1;
    }
  }

  let mut overview: Vec<TagInfo> = problem_counts
    .into_iter()
    .map(|(tag, problem_count)| {
      let (attempted, solved) = tally.get(tag).copied().unwrap_or((0, 0));
      TagInfo { tag: tag.to_string(), problem_count, attempted, solved }
    })
    .collect();
  overview.sort_by(|a, b| b.problem_count.cmp(&a.problem_count).then_with(|| a.tag.cmp(&b.tag)));
  overview
}
