//! Error taxonomy shared by engines, data sources and HTTP handlers.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use std::path::PathBuf;

use crate::protocol::ErrorResponse;

/// Failure reported by a data source. Engines never inspect it.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
  #[error("failed to read snapshot {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("malformed snapshot {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
  #[error("configuration error: {0}")]
  Configuration(String),
  #[error("upstream fetch failed: {0}")]
  UpstreamFetch(#[from] FetchError),
  /// The data spans more buckets than a derived range may produce.
  #[error("rating range {low}..{high} needs more than {limit} buckets of width {width}")]
  TooManyBuckets { low: f64, high: f64, width: f64, limit: usize },
}

impl MetricsError {
  pub fn config(message: impl Into<String>) -> Self {
    MetricsError::Configuration(message.into())
  }
}

/// Error as seen by the transport: a status code plus a stable code string.
#[derive(Debug)]
pub struct ApiError {
  status: StatusCode,
  code: &'static str,
  message: String,
}

impl ApiError {
  pub fn bad_request(message: impl Into<String>) -> Self {
    Self { status: StatusCode::BAD_REQUEST, code: "BAD_REQUEST", message: message.into() }
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    Self { status: StatusCode::NOT_FOUND, code: "NOT_FOUND", message: message.into() }
  }

  pub fn internal(message: impl Into<String>) -> Self {
    Self { status: StatusCode::INTERNAL_SERVER_ERROR, code: "INTERNAL_ERROR", message: message.into() }
  }

  pub fn status(&self) -> StatusCode { self.status }

  pub fn code(&self) -> &'static str { self.code }

  pub fn message(&self) -> &str { &self.message }

  pub fn to_body(&self) -> ErrorResponse {
    ErrorResponse::new(self.code, self.message.clone())
  }
}

impl From<MetricsError> for ApiError {
  fn from(err: MetricsError) -> Self {
    match err {
      MetricsError::Configuration(_) => Self {
        status: StatusCode::BAD_REQUEST,
        code: "CONFIGURATION_ERROR",
        message: err.to_string(),
      },
      MetricsError::UpstreamFetch(_) => Self {
        status: StatusCode::BAD_GATEWAY,
        code: "UPSTREAM_FETCH_FAILED",
        message: err.to_string(),
      },
      MetricsError::TooManyBuckets { .. } => Self {
        status: StatusCode::UNPROCESSABLE_ENTITY,
        code: "TOO_MANY_BUCKETS",
        message: err.to_string(),
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let body = self.to_body();
    (self.status, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn configuration_errors_map_to_bad_request() {
    let err: ApiError = MetricsError::config("boundaries must be strictly increasing").into();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.code(), "CONFIGURATION_ERROR");
    assert!(err.message().contains("strictly increasing"));
  }

  #[test]
  fn fetch_errors_keep_their_source_message() {
    let fetch = FetchError::Read {
      path: PathBuf::from("/nope.json"),
      source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
    };
    let err: ApiError = MetricsError::from(fetch).into();
    assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    assert!(err.message().contains("/nope.json"));
    assert!(err.message().contains("gone"));
  }

  #[test]
  fn bucket_limit_is_unprocessable_not_configuration() {
    let err: ApiError =
      MetricsError::TooManyBuckets { low: 0.0, high: 2_000_000.0, width: 100.0, limit: 10_000 }.into();
    assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err.code(), "TOO_MANY_BUCKETS");
    assert!(err.message().contains("10000"));
  }
}
