//! Loading engine configuration (bucketing, ranking, staleness) from TOML.
//!
//! Example:
//! ```toml
//! data_path = "data/snapshot.json"
//!
//! [rating]
//! bin_width = 100
//! start = 800
//! end = 3600
//! # boundaries = [800, 1200, 1600, 2000, 2400]
//!
//! [tags]
//! top_n = 10
//!
//! [abandoned]
//! staleness_days = 30
//! ```

use chrono::Duration;
use serde::Deserialize;
use tracing::{error, info};

use crate::error::MetricsError;
use crate::metrics::BinConfig;

const DEFAULT_BIN_WIDTH: f64 = 100.0;
const DEFAULT_TOP_N: i64 = 10;
const DEFAULT_STALENESS_DAYS: f64 = 30.0;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct MetricsConfig {
  /// JSON snapshot served by the file source; seeds are used when absent.
  #[serde(default)] pub data_path: Option<String>,
  #[serde(default)] pub rating: RatingCfg,
  #[serde(default)] pub tags: TagsCfg,
  #[serde(default)] pub abandoned: AbandonedCfg,
}

/// `boundaries` wins over `bin_width` when both are given.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct RatingCfg {
  #[serde(default)] pub bin_width: Option<f64>,
  #[serde(default)] pub start: Option<f64>,
  #[serde(default)] pub end: Option<f64>,
  #[serde(default)] pub boundaries: Option<Vec<f64>>,
}

impl RatingCfg {
  pub fn to_bin_config(&self) -> BinConfig {
    match &self.boundaries {
      Some(edges) => BinConfig::Boundaries(edges.clone()),
      None => BinConfig::Width {
        width: self.bin_width.unwrap_or(DEFAULT_BIN_WIDTH),
        start: self.start,
        end: self.end,
      },
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TagsCfg {
  /// `<= 0` means "no limit".
  #[serde(default = "default_top_n")] pub top_n: i64,
}

impl Default for TagsCfg {
  fn default() -> Self { Self { top_n: DEFAULT_TOP_N } }
}

fn default_top_n() -> i64 { DEFAULT_TOP_N }

#[derive(Clone, Debug, Deserialize)]
pub struct AbandonedCfg {
  #[serde(default = "default_staleness_days")] pub staleness_days: f64,
}

impl Default for AbandonedCfg {
  fn default() -> Self { Self { staleness_days: DEFAULT_STALENESS_DAYS } }
}

fn default_staleness_days() -> f64 { DEFAULT_STALENESS_DAYS }

/// Validated defaults used when a request does not override them.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineDefaults {
  pub bins: BinConfig,
  pub top_n: Option<i64>,
  pub staleness: Duration,
}

impl Default for EngineDefaults {
  fn default() -> Self {
    Self {
      bins: BinConfig::default(),
      top_n: Some(DEFAULT_TOP_N),
      staleness: Duration::days(DEFAULT_STALENESS_DAYS as i64),
    }
  }
}

impl MetricsConfig {
  pub fn engine_defaults(&self) -> Result<EngineDefaults, MetricsError> {
    let bins = self.rating.to_bin_config();
    bins.validate()?;
    Ok(EngineDefaults {
      bins,
      top_n: Some(self.tags.top_n),
      staleness: staleness_from_days(self.abandoned.staleness_days)?,
    })
  }
}

/// Convert a (possibly fractional) day count into a duration.
pub fn staleness_from_days(days: f64) -> Result<Duration, MetricsError> {
  if !days.is_finite() {
    return Err(MetricsError::config(format!("staleness must be a finite number of days, got {days}")));
  }
  if days < 0.0 {
    return Err(MetricsError::config(format!("staleness must not be negative, got {days} days")));
  }
  // Milliseconds keep fractional days exact enough without overflowing.
  let millis = (days * 86_400_000.0).round();
  if millis > i64::MAX as f64 / 2.0 {
    return Err(MetricsError::config(format!("staleness of {days} days is too large")));
  }
  Ok(Duration::milliseconds(millis as i64))
}

/// Attempt to load `MetricsConfig` from METRICS_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_metrics_config_from_env() -> Option<MetricsConfig> {
  let path = std::env::var("METRICS_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "metrics_backend", %path, "Loaded metrics config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "metrics_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "metrics_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_config(raw: &str) -> Result<MetricsConfig, toml::de::Error> {
  toml::from_str::<MetricsConfig>(raw)
}
