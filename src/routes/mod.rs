//! Router assembly: metric endpoints, WebSocket upgrade, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::protocol::{MetricKind, MetricsQuery};
use crate::state::AppState;

pub mod http;
pub mod ws;

/// One metric endpoint. Every entry is served by the same handler, which
/// dispatches on `kind`.
#[derive(Clone, Copy, Debug)]
pub struct MetricRoute {
    pub kind: MetricKind,
    pub path: &'static str,
}

pub const METRIC_ROUTES: &[MetricRoute] = &[
    MetricRoute { kind: MetricKind::RatingDistribution, path: "/api/v1/metrics/rating-distribution" },
    MetricRoute { kind: MetricKind::DifficultyDistribution, path: "/api/v1/metrics/difficulty-distribution" },
    MetricRoute { kind: MetricKind::Tags, path: "/api/v1/metrics/tags" },
    MetricRoute { kind: MetricKind::WeakTags, path: "/api/v1/metrics/weak-tags" },
    MetricRoute { kind: MetricKind::AbandonedProblems, path: "/api/v1/metrics/abandoned-problems" },
];

/// Build the application router with:
/// - WebSocket at `/ws`
/// - health and one GET endpoint per entry of `METRIC_ROUTES` under `/api/v1/...`
/// - JSON 404 for everything else
/// - CORS (allow any origin/method/headers) and per-request trace spans
pub fn build_router(state: Arc<AppState>) -> Router {
    let mut router: Router<Arc<AppState>> = Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .route("/api/v1/health", get(http::http_health));

    for route in METRIC_ROUTES {
        let kind = route.kind;
        router = router.route(
            route.path,
            get(
                move |state: State<Arc<AppState>>, query: Result<Query<MetricsQuery>, QueryRejection>| {
                    http::http_get_metric(kind, state, query)
                },
            ),
        );
    }

    router
        .fallback(http::http_not_found)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::EngineDefaults;
    use crate::seeds::{seed_attempts, seed_problems};
    use crate::store::{FileSource, MemorySource};

    fn app() -> Router {
        let source = Arc::new(MemorySource::new(seed_problems(), seed_attempts()));
        build_router(Arc::new(AppState::with_source(source, EngineDefaults::default())))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn every_metric_kind_has_exactly_one_route() {
        for kind in [
            MetricKind::RatingDistribution,
            MetricKind::DifficultyDistribution,
            MetricKind::Tags,
            MetricKind::WeakTags,
            MetricKind::AbandonedProblems,
        ] {
            assert_eq!(METRIC_ROUTES.iter().filter(|r| r.kind == kind).count(), 1, "{kind:?}");
        }
    }

    #[tokio::test]
    async fn health_is_wrapped_in_envelope() {
        let (status, body) = get_json(app(), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["ok"], true);
    }

    #[tokio::test]
    async fn rating_distribution_partitions_the_seed_set() {
        let (status, body) = get_json(app(), "/api/v1/metrics/rating-distribution?bin_width=200").await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        let buckets = data["buckets"].as_array().unwrap();
        let counted: u64 = buckets.iter().map(|b| b["count"].as_u64().unwrap()).sum();
        assert_eq!(counted + data["unrated"].as_u64().unwrap(), data["total"].as_u64().unwrap());
        assert_eq!(data["unrated"], 1);
        for pair in buckets.windows(2) {
            assert_eq!(pair[0]["high"], pair[1]["low"]);
        }
    }

    #[tokio::test]
    async fn difficulty_distribution_reports_unclassified() {
        let (_, body) = get_json(app(), "/api/v1/metrics/difficulty-distribution").await;
        let shares = body["data"]["shares"].as_array().unwrap();
        let unclassified = shares.iter().find(|s| s["label"] == "unclassified").unwrap();
        assert_eq!(unclassified["count"], 1);
    }

    #[tokio::test]
    async fn weak_tags_are_scoped_to_user() {
        let (status, body) = get_json(app(), "/api/v1/metrics/weak-tags?user_id=carol&top_n=0").await;
        assert_eq!(status, StatusCode::OK);
        let tags = body["data"]["tags"].as_array().unwrap();
        assert_eq!(tags[0]["weakness"], 1.0);
        assert!(tags.iter().all(|t| t["attempts"].as_u64().unwrap() > 0));
    }

    #[tokio::test]
    async fn tags_overview_lists_every_tag() {
        let (_, body) = get_json(app(), "/api/v1/metrics/tags").await;
        let tags = body["data"]["tags"].as_array().unwrap();
        assert!(tags.iter().any(|t| t["tag"] == "shortest paths"));
    }

    #[tokio::test]
    async fn abandoned_problems_honour_staleness_override() {
        let uri = "/api/v1/metrics/abandoned-problems?as_of=2024-06-01T00:00:00Z&staleness_days=25";
        let (status, body) = get_json(app(), uri).await;
        assert_eq!(status, StatusCode::OK);
        let problems = body["data"]["problems"].as_array().unwrap();
        let elapsed: Vec<i64> = problems.iter().map(|p| p["elapsed_seconds"].as_i64().unwrap()).collect();
        assert!(elapsed.windows(2).all(|w| w[0] >= w[1]));
        assert!(elapsed.iter().all(|s| *s >= 25 * 86_400));
        assert!(problems.iter().all(|p| p["last_outcome"] != "solved"));
    }

    #[tokio::test]
    async fn configuration_errors_use_error_envelope() {
        let (status, body) = get_json(app(), "/api/v1/metrics/rating-distribution?boundaries=1600,800").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "CONFIGURATION_ERROR");
    }

    #[tokio::test]
    async fn malformed_query_is_bad_request() {
        let (status, body) = get_json(app(), "/api/v1/metrics/weak-tags?top_n=many").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn unreadable_source_is_bad_gateway() {
        let state = AppState::with_source(Arc::new(FileSource::new("/missing/snapshot.json")), EngineDefaults::default());
        let (status, body) = get_json(build_router(Arc::new(state)), "/api/v1/metrics/tags").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "UPSTREAM_FETCH_FAILED");
    }

    #[tokio::test]
    async fn unknown_paths_get_json_404() {
        let (status, body) = get_json(app(), "/api/v1/metrics/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
    }
}
