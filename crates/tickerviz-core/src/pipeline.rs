//! Pipeline orchestrator
//!
//! Sequences the three stages over one shared [`PipelineContext`]:
//! interpret the query, synthesize the first artifact, then drive the
//! executor's bounded repair loop to a terminal state. Stages run strictly
//! in order and fail fast; an unrecoverable error from an earlier stage
//! means later stages are never invoked.

use crate::config::PipelineConfig;
use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::executor::Executor;
use crate::interpreter::QueryInterpreter;
use crate::synthesizer::CodeSynthesizer;
use std::sync::Arc;
use tickerviz_artifact::Artifact;
use tickerviz_inference::CompletionBackend;
use tickerviz_sandbox::Sandbox;

/// The three-stage pipeline
///
/// One backend instance serves both generative stages; the sandbox is owned
/// by the executor. A pipeline may run many queries, but each `run()` call
/// constructs its own context and shares no mutable state with other runs.
#[derive(Debug)]
pub struct Pipeline<B, S> {
    config: PipelineConfig,
    interpreter: QueryInterpreter<Arc<B>>,
    synthesizer: CodeSynthesizer<Arc<B>>,
    executor: Executor<S>,
}

impl<B: CompletionBackend, S: Sandbox> Pipeline<B, S> {
    /// Build a pipeline from its two external collaborators
    #[must_use]
    pub fn new(backend: B, sandbox: S, config: PipelineConfig) -> Self {
        let backend = Arc::new(backend);
        Self {
            interpreter: QueryInterpreter::new(Arc::clone(&backend), config.interpreter_retries),
            synthesizer: CodeSynthesizer::new(backend),
            executor: Executor::new(sandbox, config.max_attempts),
            config,
        }
    }

    /// Pipeline configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one query to a terminal artifact
    ///
    /// # Errors
    /// - [`PipelineError::Interpretation`] when the query cannot be turned
    ///   into a valid spec within the interpreter's retry bound
    /// - [`PipelineError::Synthesis`] / [`PipelineError::SandboxUnavailable`]
    ///   for unrecoverable collaborator failures
    /// - [`PipelineError::RetryExhausted`] when every repair attempt failed;
    ///   carries the last artifact and its ordered error history
    pub async fn run(&self, query: &str) -> Result<Artifact, PipelineError> {
        let mut ctx = PipelineContext::new(query, self.config.max_attempts);
        tracing::info!(run_id = %ctx.run_id, query, "pipeline run started");

        let spec = self.interpreter.interpret(query).await.map_err(|e| {
            tracing::error!(run_id = %ctx.run_id, error = %e, "interpretation failed");
            PipelineError::Interpretation(e)
        })?;
        tracing::info!(
            run_id = %ctx.run_id,
            symbols = ?spec.symbols,
            timeframe = %spec.timeframe,
            action = %spec.action,
            "query interpreted"
        );
        ctx.record_spec(spec.clone());

        let first = self.synthesizer.synthesize(&spec, None).await.map_err(|e| {
            tracing::error!(run_id = %ctx.run_id, error = %e, "initial synthesis failed");
            PipelineError::Synthesis(e)
        })?;
        ctx.record_artifact(first.clone());

        let artifact = self
            .executor
            .drive(&mut ctx, &spec, first, &self.synthesizer)
            .await?;

        tracing::info!(
            run_id = %ctx.run_id,
            status = %artifact.status,
            attempts = artifact.attempt,
            "pipeline run finished"
        );
        Ok(artifact)
    }
}
