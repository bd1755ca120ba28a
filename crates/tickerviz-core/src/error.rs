//! Error types for the pipeline core
//!
//! Covers the full taxonomy of a run:
//! - interpretation and synthesis failures (from the inference layer)
//! - sandbox unavailability
//! - retry-budget exhaustion, carrying the last artifact and its history
//! - state-machine integrity violations

use crate::executor::ExecState;
use tickerviz_artifact::Artifact;
use tickerviz_inference::InferenceError;
use tickerviz_sandbox::SandboxError;

/// Terminal error of a pipeline run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Query interpretation failed after its local retries
    #[error("query interpretation failed: {0}")]
    Interpretation(#[source] InferenceError),

    /// Code synthesis backend call failed
    #[error("code synthesis failed: {0}")]
    Synthesis(#[source] InferenceError),

    /// Sandbox unreachable; distinct from a sandboxed execution failing
    #[error("sandbox unavailable: {0}")]
    SandboxUnavailable(#[source] SandboxError),

    /// Repair loop exhausted its budget
    ///
    /// Carries the last artifact so callers can inspect the full ordered
    /// diagnostic history.
    #[error("retry budget exhausted after {max_attempts} attempts")]
    RetryExhausted {
        /// The configured bound that was reached
        max_attempts: u32,
        /// The last artifact, status `Failed`, with accumulated errors
        artifact: Artifact,
    },

    /// Executor attempted a transition outside the allowed table
    #[error("illegal executor transition: {from:?} -> {to:?}")]
    IllegalTransition {
        /// State the executor was in
        from: ExecState,
        /// State it attempted to enter
        to: ExecState,
    },
}

impl PipelineError {
    /// Whether this run ended by exhausting its repair budget
    #[inline]
    #[must_use]
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, Self::RetryExhausted { .. })
    }

    /// The last artifact, when the error carries one
    #[inline]
    #[must_use]
    pub fn last_artifact(&self) -> Option<&Artifact> {
        match self {
            Self::RetryExhausted { artifact, .. } => Some(artifact),
            _ => None,
        }
    }

    /// Ordered diagnostic history of the run, when available
    #[inline]
    #[must_use]
    pub fn error_history(&self) -> &[String] {
        self.last_artifact().map_or(&[], |a| a.errors.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickerviz_artifact::Artifact;

    #[test]
    fn retry_exhausted_exposes_artifact_and_history() {
        let mut artifact = Artifact::draft("bad", 2);
        artifact.mark_failed("first");
        artifact.mark_failed("second");

        let err = PipelineError::RetryExhausted {
            max_attempts: 2,
            artifact,
        };
        assert!(err.is_retry_exhausted());
        assert_eq!(err.error_history(), ["first", "second"]);
        assert_eq!(err.last_artifact().map(|a| a.attempt), Some(2));
    }

    #[test]
    fn interpretation_errors_carry_no_artifact() {
        let err = PipelineError::Interpretation(InferenceError::schema_violation(
            "field 'symbols' missing",
            "{}",
        ));
        assert!(!err.is_retry_exhausted());
        assert!(err.last_artifact().is_none());
        assert!(err.error_history().is_empty());
    }

    #[test]
    fn display_names_the_stage() {
        let err = PipelineError::Synthesis(InferenceError::BackendUnavailable(
            "refused".to_string(),
        ));
        assert!(err.to_string().contains("code synthesis failed"));
    }
}
