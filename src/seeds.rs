//! Built-in snapshot so the service is useful without a data file.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::domain::{Attempt, Difficulty, Outcome, Problem};

/// 2024-05-01T00:00:00Z; seed attempts are spread over the following weeks.
const SEED_EPOCH: i64 = 1_714_521_600;

fn day(offset: i64) -> DateTime<Utc> {
  Utc.timestamp_opt(SEED_EPOCH, 0).single().unwrap_or_default() + Duration::days(offset)
}

fn problem(id: &str, rating: Option<f64>, tags: &[&str], difficulty: Option<Difficulty>) -> Problem {
  Problem {
    id: id.into(),
    rating,
    tags: tags.iter().map(|t| t.to_string()).collect(),
    difficulty,
  }
}

fn attempt(user: &str, problem: &str, offset: i64, outcome: Outcome) -> Attempt {
  Attempt { user_id: user.into(), problem_id: problem.into(), timestamp: day(offset), outcome }
}

/// Small, hand-curated problem set covering every label and a few unrated items.
pub fn seed_problems() -> Vec<Problem> {
  use Difficulty::*;
  vec![
    problem("1520A", Some(800.0), &["implementation"], Some(Easy)),
    problem("1520B", Some(800.0), &["brute force", "math"], Some(Easy)),
    problem("1520C", Some(1000.0), &["constructive algorithms"], Some(Easy)),
    problem("1520D", Some(1200.0), &["data structures", "hashing", "math"], Some(Medium)),
    problem("1520E", Some(1400.0), &["greedy", "math"], Some(Medium)),
    problem("1520F1", Some(1600.0), &["binary search", "interactive"], Some(Medium)),
    problem("1520F2", Some(2000.0), &["binary search", "data structures", "interactive"], Some(Hard)),
    problem("1520G", Some(2200.0), &["dfs and similar", "graphs", "shortest paths"], Some(Hard)),
    problem("455A", Some(1500.0), &["dp"], Some(Medium)),
    problem("1741F", None, &["dp", "greedy"], None),
  ]
}

pub fn seed_attempts() -> Vec<Attempt> {
  use Outcome::*;
  vec![
    attempt("alice", "1520A", 0, Solved),
    attempt("alice", "1520B", 0, Attempted),
    attempt("alice", "1520B", 1, Solved),
    attempt("alice", "1520D", 2, Attempted),
    attempt("alice", "455A", 3, Attempted),
    attempt("alice", "455A", 3, Abandoned),
    attempt("alice", "1520F1", 20, Attempted),
    attempt("bob", "1520A", 1, Solved),
    attempt("bob", "1520E", 4, Attempted),
    attempt("bob", "1520E", 9, Solved),
    attempt("bob", "1520G", 5, Attempted),
    attempt("bob", "1741F", 30, Attempted),
    attempt("carol", "1520C", 2, Solved),
    attempt("carol", "1520F2", 6, Abandoned),
  ]
}
