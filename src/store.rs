//! Data access: read-only snapshots of problems and attempts, filtered by the
//! request scope before any engine sees them.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::domain::{Attempt, Problem};
use crate::error::FetchError;

/// Request filters. Empty fields do not restrict anything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scope {
    pub user_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Problems carrying at least one of these tags.
    pub tags: Vec<String>,
}

impl Scope {
    fn keeps_problem(&self, problem: &Problem) -> bool {
        self.tags.is_empty() || problem.has_any_tag(&self.tags)
    }

    fn keeps_attempt(&self, attempt: &Attempt) -> bool {
        self.user_id.as_deref().map_or(true, |u| attempt.user_id == u)
            && self.from.map_or(true, |from| attempt.timestamp >= from)
            && self.to.map_or(true, |to| attempt.timestamp <= to)
    }
}

/// Source of problem and attempt records for one request.
pub trait ProblemSource: Send + Sync {
    fn fetch_problems(&self, scope: &Scope) -> Result<Vec<Problem>, FetchError>;
    fn fetch_attempts(&self, scope: &Scope) -> Result<Vec<Attempt>, FetchError>;
}

/// On-disk and in-memory snapshot layout.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub problems: Vec<Problem>,
    #[serde(default)]
    pub attempts: Vec<Attempt>,
}

impl Snapshot {
    fn scoped_problems(&self, scope: &Scope) -> Vec<Problem> {
        self.problems
            .iter()
            .filter(|p| scope.keeps_problem(p))
            .cloned()
            .collect()
    }

    /// Attempts are kept in snapshot order so the "last record wins" tie-break
    /// stays meaningful downstream.
    fn scoped_attempts(&self, scope: &Scope) -> Vec<Attempt> {
        // Ids of problems passing the tag filter; `None` when no tag filter is set.
        let tagged: Option<HashSet<&str>> = (!scope.tags.is_empty()).then(|| {
            self.problems
                .iter()
                .filter(|p| scope.keeps_problem(p))
                .map(|p| p.id.as_str())
                .collect()
        });
        self.attempts
            .iter()
            .filter(|a| {
                scope.keeps_attempt(a)
                    && tagged.as_ref().map_or(true, |ids| ids.contains(a.problem_id.as_str()))
            })
            .cloned()
            .collect()
    }
}

/// Snapshot held in memory for the whole process lifetime.
pub struct MemorySource {
    snapshot: Snapshot,
}

impl MemorySource {
    pub fn new(problems: Vec<Problem>, attempts: Vec<Attempt>) -> Self {
        Self { snapshot: Snapshot { problems, attempts } }
    }
}

impl ProblemSource for MemorySource {
    fn fetch_problems(&self, scope: &Scope) -> Result<Vec<Problem>, FetchError> {
        Ok(self.snapshot.scoped_problems(scope))
    }

    fn fetch_attempts(&self, scope: &Scope) -> Result<Vec<Attempt>, FetchError> {
        Ok(self.snapshot.scoped_attempts(scope))
    }
}

/// JSON snapshot re-read on every fetch, so edits on disk show up without a restart.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Result<Snapshot, FetchError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| FetchError::Read {
            path: self.path.clone(),
            source,
        })?;
        let snapshot: Snapshot = serde_json::from_str(&raw).map_err(|source| FetchError::Parse {
            path: self.path.clone(),
            source,
        })?;
        debug!(target: "metrics_backend", problems = snapshot.problems.len(), attempts = snapshot.attempts.len(), "Snapshot loaded");
        Ok(snapshot)
    }
}

impl ProblemSource for FileSource {
    fn fetch_problems(&self, scope: &Scope) -> Result<Vec<Problem>, FetchError> {
        Ok(self.load()?.scoped_problems(scope))
    }

    fn fetch_attempts(&self, scope: &Scope) -> Result<Vec<Attempt>, FetchError> {
        Ok(self.load()?.scoped_attempts(scope))
    }
}
