//! Problem Metrics · Analytics Backend
//!
//! - Axum HTTP + WebSocket API over a snapshot of problems and attempts
//! - Rating/difficulty distributions, tag mastery, abandoned problem detection
//! - Built-in seed snapshot when no data file is configured
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   METRICS_CONFIG_PATH : path to TOML config (bucketing, top_n, staleness, data_path)
//!   METRICS_DATA_PATH   : JSON snapshot; overrides `data_path` from the config
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod seeds;
mod store;
mod metrics;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Invalid engine configuration aborts startup instead of failing every request.
  let state = match AppState::from_env() {
    Ok(state) => Arc::new(state),
    Err(e) => {
      error!(target: "metrics_backend", error = %e, "Refusing to start");
      return Err(e.into());
    }
  };

  let app = build_router(state);

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "metrics_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!(target: "metrics_backend", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "metrics_backend", "Shutdown signal received");
}
