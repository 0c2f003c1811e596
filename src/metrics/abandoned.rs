//! Abandoned problem detection: unsolved (user, problem) pairs that have not
//! been touched for at least the staleness threshold.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::domain::{Attempt, Outcome};
use crate::error::MetricsError;
use crate::metrics::status::current_status;

#[derive(Clone, Debug, PartialEq)]
pub struct AbandonedEntry {
  pub problem_id: String,
  pub user_id: String,
  pub last_touched: DateTime<Utc>,
  pub last_outcome: Outcome,
  pub elapsed: Duration,
}

/// Pairs whose current status is not solved and whose last attempt is at
/// least `staleness` old at `now`. Most-abandoned first; equal ages are
/// ordered by user id, then problem id.
pub fn find_abandoned(
  attempts: &[Attempt],
  now: DateTime<Utc>,
  staleness: Duration,
) -> Result<Vec<AbandonedEntry>, MetricsError> {
  if staleness < Duration::zero() {
    return Err(MetricsError::config(format!(
      "staleness must not be negative, got {}s",
      staleness.num_seconds()
    )));
  }

  let mut entries: Vec<AbandonedEntry> = current_status(attempts)
    .into_iter()
    .filter(|latest| !latest.outcome.is_solved())
    .filter_map(|latest| {
      let elapsed = now - latest.timestamp;
      (elapsed >= staleness).then(|| AbandonedEntry {
        problem_id: latest.problem_id.clone(),
        user_id: latest.user_id.clone(),
        last_touched: latest.timestamp,
        last_outcome: latest.outcome,
        elapsed,
      })
    })
    .collect();

  entries.sort_by(|a, b| {
    b.elapsed
      .cmp(&a.elapsed)
      .then_with(|| a.user_id.cmp(&b.user_id))
      .then_with(|| a.problem_id.cmp(&b.problem_id))
  });
  debug!(target: "metrics", found = entries.len(), staleness_secs = staleness.num_seconds(), "abandoned scan done");
  Ok(entries)
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
  }

  fn attempt(user: &str, problem: &str, days_ago: i64, outcome: Outcome) -> Attempt {
    Attempt {
      user_id: user.into(),
      problem_id: problem.into(),
      timestamp: now() - Duration::days(days_ago),
      outcome,
    }
  }

  #[test]
  fn stale_attempt_is_reported_with_its_age() {
    let attempts = vec![attempt("u1", "p5", 40, Outcome::Attempted)];
    let found = find_abandoned(&attempts, now(), Duration::days(30)).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].problem_id, "p5");
    assert_eq!(found[0].elapsed, Duration::days(40));

    assert!(find_abandoned(&attempts, now(), Duration::days(50)).unwrap().is_empty());
  }

  #[test]
  fn threshold_is_inclusive() {
    let attempts = vec![attempt("u1", "p1", 30, Outcome::Abandoned)];
    assert_eq!(find_abandoned(&attempts, now(), Duration::days(30)).unwrap().len(), 1);
  }

  #[test]
  fn solved_problems_are_never_abandoned() {
    let attempts = vec![
      attempt("u1", "p1", 400, Outcome::Solved),
      attempt("u1", "p2", 90, Outcome::Attempted),
      attempt("u1", "p2", 80, Outcome::Solved),
    ];
    assert!(find_abandoned(&attempts, now(), Duration::days(1)).unwrap().is_empty());
  }

  #[test]
  fn unsolved_latest_attempt_resets_the_clock() {
    let attempts = vec![
      attempt("u1", "p1", 100, Outcome::Solved),
      attempt("u1", "p1", 45, Outcome::Attempted),
    ];
    let found = find_abandoned(&attempts, now(), Duration::days(30)).unwrap();
    assert_eq!(found[0].elapsed, Duration::days(45));
  }

  #[test]
  fn most_abandoned_comes_first() {
    let attempts = vec![
      attempt("u2", "p1", 35, Outcome::Attempted),
      attempt("u1", "p3", 90, Outcome::Attempted),
      attempt("u1", "p2", 35, Outcome::Abandoned),
    ];
    let found = find_abandoned(&attempts, now(), Duration::days(30)).unwrap();
    let order: Vec<(&str, &str)> = found.iter().map(|e| (e.user_id.as_str(), e.problem_id.as_str())).collect();
    assert_eq!(order, vec![("u1", "p3"), ("u1", "p2"), ("u2", "p1")]);
  }

  #[test]
  fn negative_staleness_is_a_configuration_error() {
    let err = find_abandoned(&[], now(), Duration::days(-1)).unwrap_err();
    assert!(matches!(err, MetricsError::Configuration(_)));
    assert!(find_abandoned(&[], now(), Duration::zero()).unwrap().is_empty());
  }
}
