//! Application state: the data source and validated engine defaults.
//!
//! Everything here is read-only after startup; requests share it through an
//! `Arc` and never write to it.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::config::{load_metrics_config_from_env, EngineDefaults};
use crate::error::MetricsError;
use crate::seeds::{seed_attempts, seed_problems};
use crate::store::{FileSource, MemorySource, ProblemSource, Scope};

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn ProblemSource>,
    pub defaults: EngineDefaults,
}

impl AppState {
    /// Build state from env: load config, validate engine defaults, pick the data source.
    ///
    /// METRICS_DATA_PATH takes precedence over `data_path` from the TOML file.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Result<Self, MetricsError> {
        let cfg = load_metrics_config_from_env().unwrap_or_default();
        let defaults = cfg.engine_defaults()?;

        let data_path = std::env::var("METRICS_DATA_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .or_else(|| cfg.data_path.clone());

        let source: Arc<dyn ProblemSource> = match data_path {
            Some(path) => {
                let file = FileSource::new(path);
                info!(target: "metrics_backend", path = %file.path().display(), "Serving JSON snapshot");
                Arc::new(file)
            }
            None => {
                info!(target: "metrics_backend", "No data path configured. Serving built-in seed snapshot.");
                Arc::new(MemorySource::new(seed_problems(), seed_attempts()))
            }
        };

        let state = Self::with_source(source, defaults);
        state.log_inventory();
        Ok(state)
    }

    pub fn with_source(source: Arc<dyn ProblemSource>, defaults: EngineDefaults) -> Self {
        Self { source, defaults }
    }

    /// Startup summary of what the source currently serves. A failing source
    /// is only logged; requests will report the failure themselves.
    fn log_inventory(&self) {
        let scope = Scope::default();
        match (self.source.fetch_problems(&scope), self.source.fetch_attempts(&scope)) {
            (Ok(problems), Ok(attempts)) => {
                let rated = problems.iter().filter(|p| p.rating.is_some()).count();
                info!(
                    target: "metrics_backend",
                    problems = problems.len(),
                    rated,
                    attempts = attempts.len(),
                    bins = ?self.defaults.bins,
                    top_n = ?self.defaults.top_n,
                    staleness_secs = self.defaults.staleness.num_seconds(),
                    "Startup snapshot inventory"
                );
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(target: "metrics_backend", error = %e, "Data source not readable at startup");
            }
        }
    }
}
