//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Engine output is mapped here into the wire schema and wrapped in the
//! success/error envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Outcome;
use crate::metrics::{AbandonedEntry, DifficultyDistribution, RatingDistribution, TagInfo, TagStat};

/// Every metric the API can compute.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    RatingDistribution,
    DifficultyDistribution,
    Tags,
    WeakTags,
    AbandonedProblems,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::RatingDistribution => "rating_distribution",
            MetricKind::DifficultyDistribution => "difficulty_distribution",
            MetricKind::Tags => "tags",
            MetricKind::WeakTags => "weak_tags",
            MetricKind::AbandonedProblems => "abandoned_problems",
        }
    }
}

/// Request filters and per-request engine overrides. Shared by the HTTP
/// query string and the WebSocket `metric` message.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MetricsQuery {
    pub user_id: Option<String>,
    /// RFC 3339 lower bound on attempt timestamps.
    pub from: Option<String>,
    /// RFC 3339 upper bound on attempt timestamps.
    pub to: Option<String>,
    /// Comma-separated tag set.
    pub tags: Option<String>,
    /// RFC 3339 reference time for abandonment; defaults to now.
    pub as_of: Option<String>,

    pub bin_width: Option<f64>,
    pub start: Option<f64>,
    pub end: Option<f64>,
    /// Comma-separated bucket edges; wins over `bin_width`.
    pub boundaries: Option<String>,
    pub top_n: Option<i64>,
    pub staleness_days: Option<f64>,
}

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Metric {
        kind: MetricKind,
        #[serde(default)]
        query: MetricsQuery,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Metric {
        kind: MetricKind,
        data: MetricPayload,
    },
    Error {
        error: String,
        message: String,
    },
}

//
// Envelope
//

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { status: "success", data }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { status: "error", error: code.into(), message: message.into() }
    }
}

//
// Metric payloads
//

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MetricPayload {
    RatingDistribution(RatingDistributionOut),
    DifficultyDistribution(DifficultyDistribution),
    Tags(TagsOut),
    WeakTags(WeakTagsOut),
    AbandonedProblems(AbandonedProblemsOut),
}

/// One histogram bar; `null` edges mark the open overflow buckets.
#[derive(Debug, Serialize, PartialEq)]
pub struct RatingPointOut {
    pub low: Option<f64>,
    pub high: Option<f64>,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct RatingDistributionOut {
    pub buckets: Vec<RatingPointOut>,
    pub total: usize,
    pub rated: usize,
    pub unrated: usize,
}

impl From<RatingDistribution> for RatingDistributionOut {
    fn from(dist: RatingDistribution) -> Self {
        let finite = |edge: f64| edge.is_finite().then_some(edge);
        Self {
            buckets: dist
                .buckets
                .iter()
                .map(|b| RatingPointOut {
                    low: finite(b.low),
                    high: finite(b.high),
                    count: b.count,
                    percentage: b.percentage,
                })
                .collect(),
            total: dist.rated + dist.unrated,
            rated: dist.rated,
            unrated: dist.unrated,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TagsOut {
    pub tags: Vec<TagInfo>,
}

#[derive(Debug, Serialize)]
pub struct WeakTagsOut {
    pub tags: Vec<TagStat>,
    pub top_n: Option<i64>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct AbandonedEntryOut {
    pub problem_id: String,
    pub user_id: String,
    pub last_touched: DateTime<Utc>,
    pub last_outcome: Outcome,
    pub elapsed_seconds: i64,
    pub elapsed_days: f64,
}

impl From<AbandonedEntry> for AbandonedEntryOut {
    fn from(entry: AbandonedEntry) -> Self {
        let secs = entry.elapsed.num_seconds();
        Self {
            problem_id: entry.problem_id,
            user_id: entry.user_id,
            last_touched: entry.last_touched,
            last_outcome: entry.last_outcome,
            elapsed_seconds: secs,
            elapsed_days: crate::util::round2(secs as f64 / 86_400.0),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AbandonedProblemsOut {
    pub as_of: DateTime<Utc>,
    pub staleness_seconds: i64,
    pub problems: Vec<AbandonedEntryOut>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::rating::RatingBucket;
    use chrono::{Duration, TimeZone};

    #[test]
    fn open_bucket_edges_serialize_as_null() {
        let dist = RatingDistribution {
            buckets: vec![
                RatingBucket { low: f64::NEG_INFINITY, high: 800.0, count: 1, percentage: 50.0 },
                RatingBucket { low: 800.0, high: 900.0, count: 1, percentage: 50.0 },
            ],
            rated: 2,
            unrated: 3,
        };
        let out = RatingDistributionOut::from(dist);
        assert_eq!(out.total, 5);
        let json = serde_json::to_value(&out).unwrap();
        assert!(json["buckets"][0]["low"].is_null());
        assert_eq!(json["buckets"][1]["low"], 800.0);
    }

    #[test]
    fn abandoned_entries_report_elapsed_days() {
        let entry = AbandonedEntry {
            problem_id: "p5".into(),
            user_id: "u1".into(),
            last_touched: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            last_outcome: Outcome::Attempted,
            elapsed: Duration::days(40),
        };
        let out = AbandonedEntryOut::from(entry);
        assert_eq!(out.elapsed_days, 40.0);
        assert_eq!(out.elapsed_seconds, 40 * 86_400);
    }

    #[test]
    fn ws_metric_message_parses_with_and_without_query() {
        let msg: ClientWsMessage =
            serde_json::from_str(r#"{"type":"metric","kind":"weak_tags","query":{"top_n":3}}"#).unwrap();
        match msg {
            ClientWsMessage::Metric { kind, query } => {
                assert_eq!(kind, MetricKind::WeakTags);
                assert_eq!(query.top_n, Some(3));
            }
            other => panic!("unexpected message: {other:?}"),
        }
        let bare: ClientWsMessage =
            serde_json::from_str(r#"{"type":"metric","kind":"tags"}"#).unwrap();
        assert!(matches!(bare, ClientWsMessage::Metric { kind: MetricKind::Tags, .. }));
    }

    #[test]
    fn envelopes_carry_status() {
        let ok = serde_json::to_value(ApiResponse::success(HealthOut { ok: true })).unwrap();
        assert_eq!(ok["status"], "success");
        let err = serde_json::to_value(ErrorResponse::new("BAD_REQUEST", "nope")).unwrap();
        assert_eq!(err["status"], "error");
        assert_eq!(err["error"], "BAD_REQUEST");
    }
}
