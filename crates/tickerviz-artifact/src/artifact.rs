//! Code artifact with execution status and diagnostic history
//!
//! An [`Artifact`] is one candidate source-code unit produced by the
//! synthesizer. The executor mutates it in place (status, errors); each
//! repair cycle replaces it with a fresh draft carrying the accumulated
//! error history and an incremented attempt counter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a code artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStatus {
    /// Synthesized, not yet submitted for execution
    Draft,
    /// Submitted to the sandbox
    Executing,
    /// Sandbox reported clean completion
    Succeeded,
    /// Sandbox reported a non-zero exit or an exception
    Failed,
}

impl fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArtifactStatus::Draft => "draft",
            ArtifactStatus::Executing => "executing",
            ArtifactStatus::Succeeded => "succeeded",
            ArtifactStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A generated source-code candidate plus metadata
///
/// Owned exclusively by the pipeline run that created it; never shared
/// across concurrent runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Source code text
    pub code: String,
    /// Current lifecycle status
    pub status: ArtifactStatus,
    /// Diagnostics accumulated across attempts, oldest first
    pub errors: Vec<String>,
    /// 1-based attempt counter
    pub attempt: u32,
}

impl Artifact {
    /// Create a fresh draft for the given attempt
    #[inline]
    #[must_use]
    pub fn draft(code: impl Into<String>, attempt: u32) -> Self {
        Self {
            code: code.into(),
            status: ArtifactStatus::Draft,
            errors: Vec::new(),
            attempt,
        }
    }

    /// Carry forward the error history from a prior attempt
    #[inline]
    #[must_use]
    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }

    /// Whether the code body is effectively empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.code.trim().is_empty()
    }

    /// Whether the artifact reached a terminal status
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            ArtifactStatus::Succeeded | ArtifactStatus::Failed
        )
    }

    /// Mark as submitted to the sandbox
    pub fn begin_execution(&mut self) {
        self.status = ArtifactStatus::Executing;
    }

    /// Mark as cleanly completed
    pub fn mark_succeeded(&mut self) {
        self.status = ArtifactStatus::Succeeded;
    }

    /// Mark as failed, appending the diagnostic to the history
    pub fn mark_failed(&mut self, diagnostic: impl Into<String>) {
        self.status = ArtifactStatus::Failed;
        self.errors.push(diagnostic.into());
    }

    /// Most recent diagnostic, if any
    #[inline]
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.errors.last().map(String::as_str)
    }
}
