//! Per-run pipeline context
//!
//! One [`PipelineContext`] exists per `run()` call, owned by the orchestrator
//! for the run's duration. It is never persisted and never shared between
//! concurrent runs; two queries in flight each carry their own context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use tickerviz_artifact::{Artifact, QuerySpec};
use ulid::Ulid;

/// Unique run identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub Ulid);

impl RunId {
    /// Generate new run ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The single mutable object threaded through one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// Run identifier
    pub run_id: RunId,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Original free-text query
    pub query: String,
    spec: Option<QuerySpec>,
    artifact: Option<Artifact>,
    attempts_remaining: u32,
}

impl PipelineContext {
    /// Create a context for one run with the given repair budget
    ///
    /// The budget counts repair delegations, so it starts at
    /// `max_attempts - 1`: the first attempt is not a repair.
    #[inline]
    #[must_use]
    pub fn new(query: impl Into<String>, max_attempts: NonZeroU32) -> Self {
        Self {
            run_id: RunId::new(),
            started_at: Utc::now(),
            query: query.into(),
            spec: None,
            artifact: None,
            attempts_remaining: max_attempts.get() - 1,
        }
    }

    /// Record the interpreted spec; first write wins, the spec is immutable
    /// for the rest of the run.
    pub fn record_spec(&mut self, spec: QuerySpec) {
        debug_assert!(self.spec.is_none(), "spec recorded twice in one run");
        self.spec.get_or_insert(spec);
    }

    /// The interpreted spec, once produced
    #[inline]
    #[must_use]
    pub fn spec(&self) -> Option<&QuerySpec> {
        self.spec.as_ref()
    }

    /// Record the current artifact (replaced on each repair cycle)
    pub fn record_artifact(&mut self, artifact: Artifact) {
        self.artifact = Some(artifact);
    }

    /// The current artifact, if any
    #[inline]
    #[must_use]
    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    /// Remaining repair delegations
    #[inline]
    #[must_use]
    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    /// Spend one repair delegation; returns false when the budget is empty
    pub fn consume_attempt(&mut self) -> bool {
        if self.attempts_remaining == 0 {
            return false;
        }
        self.attempts_remaining -= 1;
        true
    }
}
