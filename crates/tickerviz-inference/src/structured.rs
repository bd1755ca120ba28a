//! Schema-constrained inference
//!
//! [`StructuredInference`] wraps a [`CompletionBackend`] with a strict
//! validation boundary: the derived JSON schema is embedded in the prompt,
//! and the response is parsed and validated against that same schema before
//! a typed value is returned. Non-conforming output is rejected with the raw
//! response attached, never coerced.

use crate::backend::{CompletionBackend, CompletionRequest};
use crate::error::InferenceError;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

/// One-shot structured inference over a completion backend
#[derive(Debug, Clone)]
pub struct StructuredInference<B> {
    backend: B,
}

impl<B: CompletionBackend> StructuredInference<B> {
    /// Wrap a backend
    #[inline]
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Infer a `T` from the given prompt
    ///
    /// Makes exactly one backend call. The prompt is extended with the JSON
    /// schema for `T` and an ONLY-JSON instruction; the response must parse
    /// as JSON and validate against the schema.
    ///
    /// # Errors
    /// - [`InferenceError::SchemaViolation`] for unparseable or
    ///   non-conforming output (raw response attached)
    /// - [`InferenceError::BackendUnavailable`] / [`InferenceError::Timeout`]
    ///   passed through from the backend
    pub async fn infer<T>(&self, prompt: &str) -> Result<T, InferenceError>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let schema = schema_value::<T>()?;
        let full_prompt = constrained_prompt(prompt, &schema);

        let raw = self
            .backend
            .complete(CompletionRequest::json(full_prompt))
            .await?;

        let value: serde_json::Value = serde_json::from_str(raw.trim()).map_err(|e| {
            InferenceError::schema_violation(format!("response is not valid JSON: {e}"), &raw)
        })?;

        let compiled = jsonschema::JSONSchema::compile(&schema).map_err(|e| {
            InferenceError::schema_violation(format!("schema failed to compile: {e}"), &raw)
        })?;

        if let Err(errors) = compiled.validate(&value) {
            let message = errors
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(InferenceError::schema_violation(message, raw));
        }

        serde_json::from_value(value)
            .map_err(|e| InferenceError::schema_violation(e.to_string(), raw))
    }
}

/// Derive the JSON schema for `T` as a plain value
fn schema_value<T: JsonSchema>() -> Result<serde_json::Value, InferenceError> {
    let schema = schemars::gen::SchemaGenerator::default().into_root_schema_for::<T>();
    serde_json::to_value(schema)
        .map_err(|e| InferenceError::schema_violation(format!("schema generation failed: {e}"), ""))
}

/// Embed the schema and the ONLY-JSON instruction into the prompt
fn constrained_prompt(prompt: &str, schema: &serde_json::Value) -> String {
    format!(
        "{prompt}\n\n\
         You MUST return ONLY a single valid JSON object.\n\
         The JSON MUST conform to this JSON schema:\n{schema}\n\
         No explanations, no extra text, ONLY the JSON."
    )
}
