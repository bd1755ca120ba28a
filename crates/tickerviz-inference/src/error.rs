//! Error types for the inference layer

/// Failures of a single inference call
#[derive(Debug, Clone, thiserror::Error)]
pub enum InferenceError {
    /// Backend output failed JSON parsing, schema validation, or domain
    /// validation. Carries the raw response for diagnostics; the layer
    /// never coerces or guesses at non-conforming output.
    #[error("schema violation: {message}")]
    SchemaViolation {
        /// What was violated, naming the field where possible
        message: String,
        /// Raw backend response as received
        raw: String,
    },

    /// Backend unreachable or returned a transport-level failure
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Backend call exceeded the caller-supplied timeout
    #[error("backend timed out after {timeout_secs}s")]
    Timeout {
        /// The timeout that was exceeded
        timeout_secs: u64,
    },
}

impl InferenceError {
    /// Shorthand constructor for schema violations
    #[inline]
    #[must_use]
    pub fn schema_violation(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::SchemaViolation {
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// Whether a caller-level retry with feedback can help
    ///
    /// Schema violations are retryable (the backend can be re-prompted with
    /// the violation appended); transport failures and timeouts are not.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SchemaViolation { .. })
    }
}
