//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs the metric kind and outcome.

use std::sync::Arc;
use axum::{extract::{rejection::QueryRejection, Query, State}, http::Uri, response::IntoResponse, Json};
use tracing::{info, instrument, warn};

use crate::error::ApiError;
use crate::logic::run_metric;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(ApiResponse::success(HealthOut { ok: true })) }

#[instrument(level = "info", skip(kind, state, query), fields(kind = kind.as_str()))]
pub async fn http_get_metric(
  kind: MetricKind,
  State(state): State<Arc<AppState>>,
  query: Result<Query<MetricsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<MetricPayload>>, ApiError> {
  let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
  match run_metric(state, kind, query).await {
    Ok(payload) => {
      info!(target: "metrics", kind = kind.as_str(), "HTTP metric served");
      Ok(Json(ApiResponse::success(payload)))
    }
    Err(e) => {
      warn!(target: "metrics", kind = kind.as_str(), code = e.code(), error = %e.message(), "HTTP metric failed");
      Err(e)
    }
  }
}

#[instrument(level = "info")]
pub async fn http_not_found(uri: Uri) -> ApiError {
  ApiError::not_found(format!("no route for {}", uri.path()))
}
