//! Current-status resolution per (user, problem) pair.

use std::collections::btree_map::{BTreeMap, Entry};

use crate::domain::Attempt;

/// Latest attempt for every (user, problem) pair, ordered by user then problem.
///
/// The most recent timestamp wins; on equal timestamps the record that comes
/// later in `attempts` wins.
pub fn current_status(attempts: &[Attempt]) -> Vec<&Attempt> {
  let mut latest: BTreeMap<(&str, &str), &Attempt> = BTreeMap::new();
  for attempt in attempts {
    match latest.entry((attempt.user_id.as_str(), attempt.problem_id.as_str())) {
      Entry::Vacant(slot) => {
        slot.insert(attempt);
      }
      Entry::Occupied(mut slot) => {
        if attempt.timestamp >= slot.get().timestamp {
          slot.insert(attempt);
        }
      }
    }
  }
  latest.into_values().collect()
}
