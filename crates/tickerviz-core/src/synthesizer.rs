//! Code synthesis
//!
//! Produces a draft [`Artifact`] satisfying a [`QuerySpec`]. Repair attempts
//! embed the prior artifact's error history verbatim so the backend sees the
//! exact failures to fix; the new draft carries that history forward with an
//! incremented attempt counter. Synthesis never executes code.

use tickerviz_artifact::{Action, Artifact, QuerySpec};
use tickerviz_inference::{CompletionBackend, CompletionRequest, InferenceError};

/// Synthesizer from spec (plus optional prior failure) to draft artifact
#[derive(Debug, Clone)]
pub struct CodeSynthesizer<B> {
    backend: B,
}

impl<B: CompletionBackend> CodeSynthesizer<B> {
    /// Synthesizer over the given backend
    #[inline]
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Synthesize a draft artifact for `spec`
    ///
    /// `attempt` is `prior.attempt + 1`, or `1` when there is no prior.
    /// The prior artifact's errors are embedded verbatim in the prompt and
    /// carried into the new draft's history.
    ///
    /// # Errors
    /// Backend transport failures only; structurally deficient output (e.g.
    /// empty code) is returned as a draft and consumed by the executor as a
    /// failed attempt.
    pub async fn synthesize(
        &self,
        spec: &QuerySpec,
        prior: Option<&Artifact>,
    ) -> Result<Artifact, InferenceError> {
        let attempt = prior.map_or(1, |a| a.attempt + 1);
        let prompt = generation_prompt(spec, prior);

        let raw = self
            .backend
            .complete(CompletionRequest::text(prompt))
            .await?;
        let code = strip_code_fences(&raw);

        tracing::debug!(attempt, code_bytes = code.len(), "artifact synthesized");

        let errors = prior.map(|a| a.errors.clone()).unwrap_or_default();
        Ok(Artifact::draft(code, attempt).with_errors(errors))
    }
}

/// Generation prompt referencing only the spec's three fields
fn generation_prompt(spec: &QuerySpec, prior: Option<&Artifact>) -> String {
    let symbols = spec.symbols.join(", ");
    let task = match spec.action {
        Action::Fetch => {
            "fetch the data with yfinance and print a closing-price summary to stdout"
        }
        Action::Plot => {
            "fetch the data with yfinance and plot the closing prices with matplotlib \
             (use the non-interactive 'Agg' backend and save the figure to 'chart.png')"
        }
    };

    let mut prompt = format!(
        "Write a self-contained Python script for stock data visualization.\n\
         Symbols: {symbols}\n\
         Period: {timeframe}\n\
         Task: {task}.\n\n\
         Requirements:\n\
         - executable as-is with no additional input\n\
         - no placeholders, no interactive display\n\
         - exit with status 0 on success\n\
         Return ONLY the Python source code.",
        timeframe = spec.timeframe,
    );

    if let Some(prior) = prior {
        if !prior.errors.is_empty() {
            prompt.push_str("\n\nThe previous script failed. Errors, oldest first:\n");
            for error in &prior.errors {
                prompt.push_str("- ");
                prompt.push_str(error);
                prompt.push('\n');
            }
            prompt.push_str("Fix these exact failures in the new script.");
        }
    }

    prompt
}

/// Strip a single surrounding markdown code fence, if present
///
/// Generation is not schema-constrained, so fenced output is normal backend
/// behavior rather than a violation.
fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // Drop the language tag line, then everything after the closing fence.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    let body = body.rsplit_once("```").map_or(body, |(inner, _)| inner);
    body.trim().to_string()
}
