//! Rating distribution: histogram of problem ratings over half-open buckets.

use serde::Serialize;
use tracing::debug;

use crate::domain::Problem;
use crate::error::MetricsError;
use crate::util::percentage;

/// Refuse configurations that would explode into absurd bucket counts.
const MAX_BUCKETS: usize = 10_000;

/// How ratings are split into buckets.
#[derive(Clone, Debug, PartialEq)]
pub enum BinConfig {
  /// Fixed-width bands with edges at `start + k * width`. Without an explicit
  /// range the bands cover the rated problems.
  Width { width: f64, start: Option<f64>, end: Option<f64> },
  /// Explicit, strictly increasing edges.
  Boundaries(Vec<f64>),
}

impl Default for BinConfig {
  fn default() -> Self {
    BinConfig::Width { width: 100.0, start: None, end: None }
  }
}

impl BinConfig {
  pub fn validate(&self) -> Result<(), MetricsError> {
    match self {
      BinConfig::Width { width, start, end } => {
        if !width.is_finite() || *width <= 0.0 {
          return Err(MetricsError::config(format!("bin width must be a positive number, got {width}")));
        }
        for edge in [start, end].into_iter().flatten() {
          if !edge.is_finite() {
            return Err(MetricsError::config("rating range bounds must be finite"));
          }
          if edge + width == *edge {
            return Err(MetricsError::config(format!("bin width {width} is below the float resolution near {edge}")));
          }
        }
        if let (Some(s), Some(e)) = (start, end) {
          if s >= e {
            return Err(MetricsError::config(format!("rating range start {s} must be below end {e}")));
          }
          if (e - s) / width > MAX_BUCKETS as f64 {
            return Err(MetricsError::config("bin width too small for rating range"));
          }
        }
        Ok(())
      }
      BinConfig::Boundaries(edges) => {
        if edges.len() < 2 {
          return Err(MetricsError::config("at least two bucket boundaries are required"));
        }
        if edges.iter().any(|e| !e.is_finite()) {
          return Err(MetricsError::config("bucket boundaries must be finite"));
        }
        if let Some(pair) = edges.windows(2).find(|w| w[0] >= w[1]) {
          return Err(MetricsError::config(format!(
            "bucket boundaries must be strictly increasing ({} is followed by {})",
            pair[0], pair[1]
          )));
        }
        Ok(())
      }
    }
  }

  /// Bucket edges for the given ratings. Empty when there is nothing to cover.
  fn edges(&self, ratings: &[f64]) -> Result<Vec<f64>, MetricsError> {
    let (width, start, end) = match self {
      BinConfig::Boundaries(edges) => return Ok(edges.clone()),
      BinConfig::Width { width, start, end } => (*width, *start, *end),
    };

    let min = ratings.iter().copied().reduce(f64::min);
    let max = ratings.iter().copied().reduce(f64::max);

    let low = match (start, min) {
      (Some(s), _) => s,
      (None, Some(m)) => (m / width).floor() * width,
      (None, None) => return Ok(Vec::new()),
    };
    // An explicit end is the last edge; a data-derived top must sit strictly inside.
    let (top, inclusive_top) = match (end, max) {
      (Some(e), _) => (e, true),
      (None, Some(m)) => (m, false),
      (None, None) => (low, false),
    };

    // Only reachable with a data-derived bound; an explicit range is checked in `validate`.
    if (top - low) / width > MAX_BUCKETS as f64 {
      return Err(MetricsError::TooManyBuckets { low, high: top, width, limit: MAX_BUCKETS });
    }

    let mut edges = vec![low];
    let mut prev = low;
    let mut k = 1usize;
    loop {
      let edge = low + k as f64 * width;
      // Rounding must not collapse a bucket to `[x, x)`.
      if edge <= prev {
        return Err(MetricsError::config(format!("bin width {width} is below the float resolution near {prev}")));
      }
      edges.push(edge);
      if (inclusive_top && edge >= top) || (!inclusive_top && edge > top) {
        break;
      }
      prev = edge;
      k += 1;
    }
    Ok(edges)
  }
}

/// `[low, high)`; `low` may be `-inf` and `high` may be `+inf` for the
/// overflow buckets around an explicit range.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RatingBucket {
  pub low: f64,
  pub high: f64,
  pub count: usize,
  pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RatingDistribution {
  pub buckets: Vec<RatingBucket>,
  pub rated: usize,
  pub unrated: usize,
}

/// Histogram of ratings. Problems without a (finite) rating only show up in
/// `unrated`. Configuration is validated before anything is counted.
pub fn compute_rating_distribution(
  problems: &[Problem],
  config: &BinConfig,
) -> Result<RatingDistribution, MetricsError> {
  config.validate()?;

  let ratings: Vec<f64> = problems
    .iter()
    .filter_map(|p| p.rating)
    .filter(|r| r.is_finite())
    .collect();
  let rated = ratings.len();
  let unrated = problems.len() - rated;

  let edges = config.edges(&ratings)?;
  let mut counts = vec![0usize; edges.len().saturating_sub(1)];
  let (mut below, mut above) = (0usize, 0usize);

  for rating in &ratings {
    // Number of edges <= rating; a rating on an edge lands in the bucket it opens.
    let idx = edges.partition_point(|edge| *edge <= *rating);
    if idx == 0 {
      below += 1;
    } else if idx == edges.len() {
      above += 1;
    } else {
      counts[idx - 1] += 1;
    }
  }

  let mut buckets = Vec::with_capacity(counts.len() + 2);
  if below > 0 {
    buckets.push(RatingBucket {
      low: f64::NEG_INFINITY,
      high: edges[0],
      count: below,
      percentage: percentage(below, rated),
    });
  }
  for (i, count) in counts.iter().enumerate() {
    buckets.push(RatingBucket {
      low: edges[i],
      high: edges[i + 1],
      count: *count,
      percentage: percentage(*count, rated),
    });
  }
  if above > 0 {
    if let Some(last) = edges.last() {
      buckets.push(RatingBucket {
        low: *last,
        high: f64::INFINITY,
        count: above,
        percentage: percentage(above, rated),
      });
    }
  }

  debug!(target: "metrics", rated, unrated, buckets = buckets.len(), below, above, "rating distribution computed");
  Ok(RatingDistribution { buckets, rated, unrated })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn problem(id: &str, rating: Option<f64>) -> Problem {
    Problem { id: id.into(), rating, tags: vec!["dp".into()], difficulty: None }
  }

  fn width(w: f64) -> BinConfig {
    BinConfig::Width { width: w, start: None, end: None }
  }

  fn assert_partition(dist: &RatingDistribution, total: usize) {
    let counted: usize = dist.buckets.iter().map(|b| b.count).sum();
    assert_eq!(counted + dist.unrated, total);
    for pair in dist.buckets.windows(2) {
      assert_eq!(pair[0].high, pair[1].low);
    }
  }

  #[test]
  fn two_close_ratings_share_one_band() {
    let problems = vec![problem("1", Some(1200.0)), problem("2", Some(1250.0))];
    let dist = compute_rating_distribution(&problems, &width(100.0)).unwrap();
    assert_eq!(dist.unrated, 0);
    let full: Vec<_> = dist.buckets.iter().filter(|b| b.count > 0).collect();
    assert_eq!(full.len(), 1);
    assert_eq!((full[0].low, full[0].high, full[0].count), (1200.0, 1300.0, 2));
    assert_eq!(full[0].percentage, 100.0);
    assert_partition(&dist, 2);
  }

  #[test]
  fn empty_bands_are_kept_between_populated_ones() {
    let problems = vec![problem("1", Some(800.0)), problem("2", Some(1150.0)), problem("3", None)];
    let dist = compute_rating_distribution(&problems, &width(100.0)).unwrap();
    let lows: Vec<f64> = dist.buckets.iter().map(|b| b.low).collect();
    assert_eq!(lows, vec![800.0, 900.0, 1000.0, 1100.0]);
    assert_eq!(dist.buckets.iter().map(|b| b.count).collect::<Vec<_>>(), vec![1, 0, 0, 1]);
    assert_eq!(dist.unrated, 1);
    assert_partition(&dist, 3);
  }

  #[test]
  fn rating_on_boundary_falls_into_upper_bucket() {
    let problems = vec![problem("1", Some(1200.0))];
    let config = BinConfig::Boundaries(vec![1000.0, 1200.0, 1400.0]);
    let dist = compute_rating_distribution(&problems, &config).unwrap();
    assert_eq!(dist.buckets[0].count, 0);
    assert_eq!(dist.buckets[1].count, 1);
    assert_partition(&dist, 1);
  }

  #[test]
  fn out_of_range_ratings_get_open_buckets() {
    let problems = vec![problem("1", Some(500.0)), problem("2", Some(1000.0)), problem("3", Some(2000.0))];
    let config = BinConfig::Boundaries(vec![800.0, 1200.0, 1600.0]);
    let dist = compute_rating_distribution(&problems, &config).unwrap();
    assert_eq!(dist.buckets.len(), 4);
    assert_eq!(dist.buckets[0].low, f64::NEG_INFINITY);
    assert_eq!(dist.buckets[3].high, f64::INFINITY);
    assert_eq!(dist.buckets.iter().map(|b| b.count).collect::<Vec<_>>(), vec![1, 1, 0, 1]);
    assert_partition(&dist, 3);
  }

  #[test]
  fn explicit_range_renders_full_histogram_for_empty_input() {
    let config = BinConfig::Width { width: 400.0, start: Some(800.0), end: Some(2000.0) };
    let dist = compute_rating_distribution(&[], &config).unwrap();
    assert_eq!(dist.buckets.len(), 3);
    assert!(dist.buckets.iter().all(|b| b.count == 0 && b.percentage == 0.0));
    assert_eq!(dist.buckets[2].high, 2000.0);
  }

  #[test]
  fn derived_range_is_empty_without_ratings() {
    let dist = compute_rating_distribution(&[problem("1", None)], &width(100.0)).unwrap();
    assert!(dist.buckets.is_empty());
    assert_eq!((dist.rated, dist.unrated), (0, 1));
  }

  #[test]
  fn non_increasing_boundaries_are_rejected() {
    let config = BinConfig::Boundaries(vec![800.0, 800.0, 1200.0]);
    let err = compute_rating_distribution(&[], &config).unwrap_err();
    assert!(matches!(err, MetricsError::Configuration(_)));
    assert!(BinConfig::Boundaries(vec![1200.0, 800.0]).validate().is_err());
    assert!(width(0.0).validate().is_err());
    assert!(width(-5.0).validate().is_err());
  }

  #[test]
  fn width_below_float_resolution_is_rejected() {
    let problems = vec![problem("1", Some(1_000_000.0))];
    let err = compute_rating_distribution(&problems, &width(1e-13)).unwrap_err();
    assert!(matches!(err, MetricsError::Configuration(_)));

    let ranged = BinConfig::Width { width: 1e-13, start: Some(1_000_000.0), end: Some(1_000_001.0) };
    assert!(matches!(ranged.validate(), Err(MetricsError::Configuration(_))));
  }

  #[test]
  fn tiny_widths_still_give_strictly_increasing_edges() {
    let problems = vec![problem("1", Some(1.0)), problem("2", Some(1.0 + 5e-9))];
    let dist = compute_rating_distribution(&problems, &width(1e-9)).unwrap();
    assert!(dist.buckets.iter().all(|b| b.low < b.high));
    assert_partition(&dist, 2);
  }

  #[test]
  fn derived_range_beyond_bucket_limit_is_not_a_configuration_error() {
    let problems = vec![problem("1", Some(0.0)), problem("2", Some(2_000_000.0))];
    assert!(width(100.0).validate().is_ok());
    let err = compute_rating_distribution(&problems, &width(100.0)).unwrap_err();
    assert!(matches!(err, MetricsError::TooManyBuckets { limit: MAX_BUCKETS, .. }));
  }

  #[test]
  fn same_input_yields_same_output() {
    let problems: Vec<Problem> = (0..50)
      .map(|i| problem(&i.to_string(), Some(800.0 + (i * 37 % 900) as f64)))
      .collect();
    let a = compute_rating_distribution(&problems, &width(100.0)).unwrap();
    let b = compute_rating_distribution(&problems, &width(100.0)).unwrap();
    assert_eq!(a, b);
    assert_partition(&a, 50);
  }
}
