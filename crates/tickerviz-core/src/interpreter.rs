//! Query interpretation
//!
//! Turns raw query text into a validated [`QuerySpec`] through the
//! structured-inference boundary, then applies the domain constraints the
//! raw JSON schema cannot express (symbol set non-empty, timeframe token
//! recognized). Schema violations are retried locally with the violation
//! appended to the prompt, up to a configured bound.

use tickerviz_artifact::QuerySpec;
use tickerviz_inference::{CompletionBackend, InferenceError, StructuredInference};

/// Interpreter from free text to [`QuerySpec`]
#[derive(Debug, Clone)]
pub struct QueryInterpreter<B> {
    inference: StructuredInference<B>,
    max_retries: u32,
}

impl<B: CompletionBackend> QueryInterpreter<B> {
    /// Interpreter with `max_retries` additional attempts after a violation
    #[inline]
    #[must_use]
    pub fn new(backend: B, max_retries: u32) -> Self {
        Self {
            inference: StructuredInference::new(backend),
            max_retries,
        }
    }

    /// Interpret one query
    ///
    /// Each attempt makes one backend call. A [`SchemaViolation`] from the
    /// inference layer, or a domain-validation failure, triggers a retry
    /// with the violation message appended as feedback; transport failures
    /// are never retried here.
    ///
    /// # Errors
    /// The last [`InferenceError::SchemaViolation`] once retries are
    /// exhausted, or the first `BackendUnavailable`/`Timeout`.
    ///
    /// [`SchemaViolation`]: InferenceError::SchemaViolation
    pub async fn interpret(&self, query: &str) -> Result<QuerySpec, InferenceError> {
        let mut feedback: Option<String> = None;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let prompt = extraction_prompt(query, feedback.as_deref());

            let violation = match self.inference.infer::<QuerySpec>(&prompt).await {
                Ok(mut spec) => {
                    spec.normalize();
                    match spec.validate() {
                        Ok(()) => {
                            tracing::debug!(
                                attempt,
                                symbols = ?spec.symbols,
                                timeframe = %spec.timeframe,
                                "query interpreted"
                            );
                            return Ok(spec);
                        }
                        Err(domain) => InferenceError::schema_violation(
                            domain.to_string(),
                            serde_json::to_string(&spec).unwrap_or_default(),
                        ),
                    }
                }
                Err(err) if err.is_retryable() => err,
                Err(fatal) => return Err(fatal),
            };

            if attempt > self.max_retries {
                return Err(violation);
            }

            tracing::warn!(attempt, error = %violation, "interpretation rejected, retrying with feedback");
            feedback = Some(violation.to_string());
        }
    }
}

/// Extraction prompt, optionally with feedback from a rejected attempt
fn extraction_prompt(query: &str, feedback: Option<&str>) -> String {
    let mut prompt = format!(
        "Analyze the user query and extract stock details.\n\
         Extract: the stock ticker symbols, the time period (one of: 1d, 5d, \
         1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max), and the action to \
         perform ('fetch' or 'plot').\n\n\
         User query: {query}"
    );
    if let Some(feedback) = feedback {
        prompt.push_str(&format!(
            "\n\nYour previous answer was rejected: {feedback}\n\
             Correct the output and answer again."
        ));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_the_three_fields() {
        let prompt = extraction_prompt("Plot YTD stock gain of Google", None);
        assert!(prompt.contains("ticker symbols"));
        assert!(prompt.contains("time period"));
        assert!(prompt.contains("action"));
        assert!(prompt.contains("Plot YTD stock gain of Google"));
        assert!(!prompt.contains("rejected"));
    }

    #[test]
    fn feedback_appended_verbatim() {
        let prompt = extraction_prompt(
            "show tesla",
            Some("field 'timeframe': 'fortnight' is not a recognized period"),
        );
        assert!(prompt.contains("'fortnight' is not a recognized period"));
        assert!(prompt.contains("rejected"));
    }
}
