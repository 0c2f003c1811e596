//! Small utility helpers used across modules.

/// Share of `count` in `total` as a percentage rounded to two decimals.
/// A zero total yields 0 rather than NaN.
pub fn percentage(count: usize, total: usize) -> f64 {
  if total == 0 {
    return 0.0;
  }
  round2(count as f64 * 100.0 / total as f64)
}

pub fn round2(value: f64) -> f64 {
  (value * 100.0).round() / 100.0
}

/// Split a comma-separated query value, trimming blanks away.
pub fn split_list(raw: &str) -> Vec<String> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}

/// Parse a comma-separated list of numbers, e.g. "800,1200,1600".
pub fn parse_number_list(raw: &str) -> Result<Vec<f64>, String> {
  split_list(raw)
    .iter()
    .map(|s| s.parse::<f64>().map_err(|_| format!("not a number: {s:?}")))
    .collect()
}
