//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! A metric request goes through three steps:
//!   - resolve the query into a scope plus engine settings (validated up front)
//!   - fetch the scoped snapshot from the data source
//!   - run exactly one engine and map its output to the wire payload

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, instrument};

use crate::config::{staleness_from_days, EngineDefaults};
use crate::domain::{Attempt, Problem};
use crate::error::{ApiError, MetricsError};
use crate::metrics::{
  compute_difficulty_distribution, compute_rating_distribution, compute_tag_overview, compute_weak_tags,
  find_abandoned, BinConfig,
};
use crate::protocol::{AbandonedProblemsOut, MetricKind, MetricPayload, MetricsQuery, TagsOut, WeakTagsOut};
use crate::state::AppState;
use crate::store::Scope;
use crate::util::{parse_number_list, split_list};

/// Fully resolved request: what to fetch and how to configure the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricRequest {
  pub scope: Scope,
  pub now: DateTime<Utc>,
  pub bins: BinConfig,
  pub top_n: Option<i64>,
  pub staleness: Duration,
}

fn parse_time(field: &str, raw: &Option<String>) -> Result<Option<DateTime<Utc>>, ApiError> {
  match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
    None => Ok(None),
    Some(s) => DateTime::parse_from_rfc3339(s)
      .map(|t| Some(t.with_timezone(&Utc)))
      .map_err(|e| ApiError::bad_request(format!("{field}: invalid RFC 3339 timestamp {s:?} ({e})"))),
  }
}

fn resolve_bins(query: &MetricsQuery, defaults: &BinConfig) -> Result<BinConfig, ApiError> {
  if let Some(raw) = &query.boundaries {
    let edges = parse_number_list(raw).map_err(|e| ApiError::bad_request(format!("boundaries: {e}")))?;
    return Ok(BinConfig::Boundaries(edges));
  }
  Ok(match defaults {
    BinConfig::Width { width, start, end } => BinConfig::Width {
      width: query.bin_width.unwrap_or(*width),
      start: query.start.or(*start),
      end: query.end.or(*end),
    },
    BinConfig::Boundaries(_) => match query.bin_width {
      Some(width) => BinConfig::Width { width, start: query.start, end: query.end },
      None => defaults.clone(),
    },
  })
}

impl MetricRequest {
  /// Resolve filters and overrides. Only the settings `kind` actually consumes
  /// are validated, and all of that happens before any data is fetched.
  pub fn resolve(
    kind: MetricKind,
    query: &MetricsQuery,
    defaults: &EngineDefaults,
    now: DateTime<Utc>,
  ) -> Result<Self, ApiError> {
    let scope = Scope {
      user_id: query.user_id.as_deref().map(str::trim).filter(|u| !u.is_empty()).map(str::to_string),
      from: parse_time("from", &query.from)?,
      to: parse_time("to", &query.to)?,
      tags: query.tags.as_deref().map(split_list).unwrap_or_default(),
    };
    if let (Some(from), Some(to)) = (scope.from, scope.to) {
      if from > to {
        return Err(ApiError::bad_request("from must not be after to"));
      }
    }

    let bins = if kind == MetricKind::RatingDistribution {
      let bins = resolve_bins(query, &defaults.bins)?;
      bins.validate()?;
      bins
    } else {
      defaults.bins.clone()
    };
    let staleness = match query.staleness_days {
      Some(days) if kind == MetricKind::AbandonedProblems => staleness_from_days(days)?,
      _ => defaults.staleness,
    };

    Ok(Self {
      scope,
      now: parse_time("as_of", &query.as_of)?.unwrap_or(now),
      bins,
      top_n: query.top_n.or(defaults.top_n),
      staleness,
    })
  }
}

fn fetch_problems(state: &AppState, scope: &Scope) -> Result<Vec<Problem>, MetricsError> {
  Ok(state.source.fetch_problems(scope)?)
}

fn fetch_attempts(state: &AppState, scope: &Scope) -> Result<Vec<Attempt>, MetricsError> {
  Ok(state.source.fetch_attempts(scope)?)
}

/// Synchronous core: validate, fetch, compute. Fetch failures are passed
/// through untouched.
#[instrument(level = "info", skip(state, kind, query), fields(kind = kind.as_str()))]
pub fn compute_metric(
  state: &AppState,
  kind: MetricKind,
  query: &MetricsQuery,
  now: DateTime<Utc>,
) -> Result<MetricPayload, ApiError> {
  let req = MetricRequest::resolve(kind, query, &state.defaults, now)?;
  debug!(target: "metrics", scope = ?req.scope, "Resolved metric request");

  let payload = match kind {
    MetricKind::RatingDistribution => {
      let problems = fetch_problems(state, &req.scope)?;
      MetricPayload::RatingDistribution(compute_rating_distribution(&problems, &req.bins)?.into())
    }
    MetricKind::DifficultyDistribution => {
      let problems = fetch_problems(state, &req.scope)?;
      MetricPayload::DifficultyDistribution(compute_difficulty_distribution(&problems))
    }
    MetricKind::Tags => {
      let problems = fetch_problems(state, &req.scope)?;
      let attempts = fetch_attempts(state, &req.scope)?;
      MetricPayload::Tags(TagsOut { tags: compute_tag_overview(&problems, &attempts) })
    }
    MetricKind::WeakTags => {
      let problems = fetch_problems(state, &req.scope)?;
      let attempts = fetch_attempts(state, &req.scope)?;
      MetricPayload::WeakTags(WeakTagsOut {
        tags: compute_weak_tags(&attempts, &problems, req.top_n),
        top_n: req.top_n,
      })
    }
    MetricKind::AbandonedProblems => {
      let attempts = fetch_attempts(state, &req.scope)?;
      let entries = find_abandoned(&attempts, req.now, req.staleness)?;
      MetricPayload::AbandonedProblems(AbandonedProblemsOut {
        as_of: req.now,
        staleness_seconds: req.staleness.num_seconds(),
        problems: entries.into_iter().map(Into::into).collect(),
      })
    }
  };
  info!(target: "metrics", kind = kind.as_str(), "Metric computed");
  Ok(payload)
}

/// Run a metric off the async runtime; file-backed sources read from disk.
pub async fn run_metric(state: Arc<AppState>, kind: MetricKind, query: MetricsQuery) -> Result<MetricPayload, ApiError> {
  let now = Utc::now();
  tokio::task::spawn_blocking(move || compute_metric(&state, kind, &query, now))
    .await
    .unwrap_or_else(|e| {
      error!(target: "metrics", kind = kind.as_str(), error = %e, "Metric task failed");
      Err(ApiError::internal("metric computation aborted"))
    })
}
