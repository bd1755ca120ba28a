//! Structured inference layer
//!
//! Turns one text-completion call into a validated structured value:
//! - [`CompletionBackend`]: the capability seam over a model backend
//! - [`OllamaBackend`]: HTTP backend for an Ollama-compatible server
//! - [`StructuredInference`]: schema-constrained request, strict validation
//!   of the response, typed result or [`InferenceError::SchemaViolation`]
//!
//! This layer makes exactly one backend call per invocation and never
//! retries; retry policy belongs to the caller.

pub mod backend;
pub mod error;
pub mod structured;

pub use backend::{CompletionBackend, CompletionRequest, OllamaBackend};
pub use error::InferenceError;
pub use structured::StructuredInference;
