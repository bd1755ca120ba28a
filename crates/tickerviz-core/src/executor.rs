//! Execution and bounded repair
//!
//! Drives one artifact to a terminal state through the sandbox:
//!
//! ```text
//! Draft -> Executing -> { Succeeded, Failed }
//! Failed -> Delegated -> Draft      while attempt < max_attempts
//! Failed -> Terminal                once the budget is exhausted
//! ```
//!
//! Delegation is a deterministic transition gated by the numeric retry
//! budget: the failed artifact's error history is handed back to the
//! synthesizer, which produces the next draft. Every transition is checked
//! against the allowed table.

use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::synthesizer::CodeSynthesizer;
use std::num::NonZeroU32;
use tickerviz_artifact::{Artifact, QuerySpec};
use tickerviz_inference::CompletionBackend;
use tickerviz_sandbox::{Sandbox, SandboxError};

/// Executor state for one artifact lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecState {
    /// Fresh artifact from the synthesizer
    Draft,
    /// Submitted to the sandbox
    Executing,
    /// Clean completion; terminal for the run
    Succeeded,
    /// Execution failed; budget decides what happens next
    Failed,
    /// Failure handed back to the synthesizer
    Delegated,
    /// Budget exhausted; terminal for the run
    Terminal,
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: ExecState) -> Vec<ExecState> {
    use ExecState::*;
    match from {
        Draft => vec![Executing],
        Executing => vec![Succeeded, Failed],
        Failed => vec![Delegated, Terminal],
        Delegated => vec![Draft],
        Succeeded | Terminal => vec![],
    }
}

/// Move `state` to `to` if the table allows it
fn transition(state: &mut ExecState, to: ExecState) -> Result<(), PipelineError> {
    if allowed_transitions(*state).contains(&to) {
        tracing::trace!(from = ?*state, ?to, "executor transition");
        *state = to;
        Ok(())
    } else {
        Err(PipelineError::IllegalTransition { from: *state, to })
    }
}

/// Drives artifacts through the sandbox with a bounded repair loop
#[derive(Debug)]
pub struct Executor<S> {
    sandbox: S,
    max_attempts: NonZeroU32,
}

impl<S: Sandbox> Executor<S> {
    /// Executor over `sandbox` with a total attempt bound
    #[inline]
    #[must_use]
    pub fn new(sandbox: S, max_attempts: NonZeroU32) -> Self {
        Self {
            sandbox,
            max_attempts,
        }
    }

    /// Drive `artifact` to a terminal state
    ///
    /// On each failure with budget remaining, delegates `(spec, errors)` to
    /// the synthesizer and re-enters `Draft` with the replacement artifact.
    ///
    /// # Errors
    /// - [`PipelineError::RetryExhausted`] with the last artifact once
    ///   `attempt == max_attempts` fails
    /// - [`PipelineError::Synthesis`] if a repair synthesis call fails
    /// - [`PipelineError::SandboxUnavailable`] if execution cannot start
    pub async fn drive<B: CompletionBackend>(
        &self,
        ctx: &mut PipelineContext,
        spec: &QuerySpec,
        mut artifact: Artifact,
        synthesizer: &CodeSynthesizer<B>,
    ) -> Result<Artifact, PipelineError> {
        let mut state = ExecState::Draft;

        loop {
            match state {
                ExecState::Draft => {
                    transition(&mut state, ExecState::Executing)?;
                    if artifact.is_empty() {
                        // Structural synthesis failure: consumed as a failed
                        // attempt, never submitted to the sandbox.
                        artifact.mark_failed("synthesizer produced an empty artifact");
                        transition(&mut state, ExecState::Failed)?;
                    } else {
                        artifact.begin_execution();
                    }
                }
                ExecState::Executing => match self.sandbox.execute(&artifact.code).await {
                    Ok(outcome) if outcome.is_success() => {
                        tracing::info!(attempt = artifact.attempt, "execution succeeded");
                        artifact.mark_succeeded();
                        transition(&mut state, ExecState::Succeeded)?;
                    }
                    Ok(outcome) => {
                        let diagnostic = outcome.diagnostic();
                        tracing::warn!(
                            attempt = artifact.attempt,
                            exit_status = outcome.exit_status,
                            %diagnostic,
                            "execution failed"
                        );
                        artifact.mark_failed(diagnostic);
                        transition(&mut state, ExecState::Failed)?;
                    }
                    Err(SandboxError::TimedOut { limit_secs }) => {
                        // The sandbox's own ceiling fired: a property of the
                        // submitted code, recoverable via delegation.
                        artifact.mark_failed(format!(
                            "execution exceeded the {limit_secs}s sandbox time limit"
                        ));
                        transition(&mut state, ExecState::Failed)?;
                    }
                    Err(fatal) => return Err(PipelineError::SandboxUnavailable(fatal)),
                },
                ExecState::Failed => {
                    if artifact.attempt < self.max_attempts.get() {
                        transition(&mut state, ExecState::Delegated)?;
                    } else {
                        transition(&mut state, ExecState::Terminal)?;
                    }
                }
                ExecState::Delegated => {
                    ctx.consume_attempt();
                    tracing::info!(
                        failed_attempt = artifact.attempt,
                        attempts_remaining = ctx.attempts_remaining(),
                        "delegating failure back to synthesizer"
                    );
                    artifact = synthesizer
                        .synthesize(spec, Some(&artifact))
                        .await
                        .map_err(PipelineError::Synthesis)?;
                    ctx.record_artifact(artifact.clone());
                    transition(&mut state, ExecState::Draft)?;
                }
                ExecState::Succeeded => {
                    ctx.record_artifact(artifact.clone());
                    return Ok(artifact);
                }
                ExecState::Terminal => {
                    ctx.record_artifact(artifact.clone());
                    return Err(PipelineError::RetryExhausted {
                        max_attempts: self.max_attempts.get(),
                        artifact,
                    });
                }
            }
        }
    }
}
