//! Text-completion backend seam
//!
//! One request, one response, bounded by a timeout. The production backend
//! speaks the Ollama chat API; tests substitute a scripted implementation.

use crate::error::InferenceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// One completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Prompt text sent to the backend
    pub prompt: String,
    /// Constrain the backend to emit a single JSON object
    pub json: bool,
}

impl CompletionRequest {
    /// Free-text completion (code generation)
    #[inline]
    #[must_use]
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            json: false,
        }
    }

    /// JSON-constrained completion (structured extraction)
    #[inline]
    #[must_use]
    pub fn json(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            json: true,
        }
    }
}

/// Capability seam over a model backend
///
/// Implementations make exactly one network call per invocation and map
/// transport failures to [`InferenceError::BackendUnavailable`] and timeouts
/// to [`InferenceError::Timeout`]. No retries at this layer.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Complete one request, returning the raw response text
    async fn complete(&self, request: CompletionRequest) -> Result<String, InferenceError>;
}

#[async_trait]
impl<B: CompletionBackend + ?Sized> CompletionBackend for Arc<B> {
    async fn complete(&self, request: CompletionRequest) -> Result<String, InferenceError> {
        (**self).complete(request).await
    }
}

/// Model stays loaded between pipeline stages, released shortly after.
const DEFAULT_KEEP_ALIVE: &str = "5m";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    keep_alive: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// HTTP backend for an Ollama-compatible chat endpoint
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    http: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaBackend {
    /// Create a backend against `base_url` (e.g. `http://127.0.0.1:11434`)
    ///
    /// # Errors
    /// Returns [`InferenceError::BackendUnavailable`] if the HTTP client
    /// cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, InferenceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InferenceError::BackendUnavailable(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
        })
    }

    /// Configured model name
    #[inline]
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionBackend for OllamaBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<String, InferenceError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            stream: false,
            format: request.json.then_some("json"),
            keep_alive: DEFAULT_KEEP_ALIVE,
        };

        tracing::debug!(
            model = %self.model,
            json = request.json,
            prompt_chars = request.prompt.len(),
            "sending completion request"
        );

        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout {
                        timeout_secs: self.timeout.as_secs(),
                    }
                } else {
                    InferenceError::BackendUnavailable(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(InferenceError::BackendUnavailable(format!(
                "backend returned HTTP {}",
                response.status()
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::BackendUnavailable(e.to_string()))?;

        tracing::debug!(response_chars = chat.message.content.len(), "completion received");
        Ok(chat.message.content)
    }
}
