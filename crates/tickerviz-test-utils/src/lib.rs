//! Testing utilities for the tickerviz workspace
//!
//! Scripted stand-ins for the two external collaborators (model backend and
//! sandbox) plus common fixtures. The scripted fakes replay queued responses
//! in order and record what they were asked, so tests can assert on prompt
//! content (e.g. that repair prompts carry prior errors verbatim).

#![allow(missing_docs)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tickerviz_artifact::{Action, QuerySpec};
use tickerviz_inference::{CompletionBackend, CompletionRequest, InferenceError};
use tickerviz_sandbox::{ExecutionOutcome, Sandbox, SandboxError};

/// Completion backend that replays queued responses in order
///
/// Clones share the same script and prompt log, so one instance can serve
/// both the interpreter and the synthesizer within a pipeline.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    inner: Arc<ScriptedBackendInner>,
}

#[derive(Default)]
struct ScriptedBackendInner {
    responses: Mutex<VecDeque<Result<String, InferenceError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response
    #[must_use]
    pub fn respond(self, response: impl Into<String>) -> Self {
        self.inner
            .responses
            .lock()
            .unwrap()
            .push_back(Ok(response.into()));
        self
    }

    /// Queue a failure
    #[must_use]
    pub fn fail(self, error: InferenceError) -> Self {
        self.inner.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// All requests seen so far, in order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.inner.requests.lock().unwrap().clone()
    }

    /// Responses still queued
    pub fn remaining(&self) -> usize {
        self.inner.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<String, InferenceError> {
        self.inner.requests.lock().unwrap().push(request);
        self.inner
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(InferenceError::BackendUnavailable(
                    "scripted backend exhausted".to_string(),
                ))
            })
    }
}

/// Sandbox that replays queued outcomes in order
#[derive(Clone, Default)]
pub struct ScriptedSandbox {
    inner: Arc<ScriptedSandboxInner>,
}

#[derive(Default)]
struct ScriptedSandboxInner {
    outcomes: Mutex<VecDeque<Result<ExecutionOutcome, SandboxError>>>,
    submissions: Mutex<Vec<String>>,
}

impl ScriptedSandbox {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn outcome(self, outcome: ExecutionOutcome) -> Self {
        self.inner.outcomes.lock().unwrap().push_back(Ok(outcome));
        self
    }

    #[must_use]
    pub fn fail(self, error: SandboxError) -> Self {
        self.inner.outcomes.lock().unwrap().push_back(Err(error));
        self
    }

    /// Code submitted for execution, in order
    pub fn submissions(&self) -> Vec<String> {
        self.inner.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sandbox for ScriptedSandbox {
    async fn execute(&self, code: &str) -> Result<ExecutionOutcome, SandboxError> {
        self.inner.submissions.lock().unwrap().push(code.to_string());
        self.inner
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(SandboxError::Unavailable(
                    "scripted sandbox exhausted".to_string(),
                ))
            })
    }
}

/// Valid extraction response for "Plot YTD stock gain of Google"
pub fn google_ytd_json() -> String {
    r#"{"symbols":["GOOGL"],"timeframe":"ytd","action":"plot"}"#.to_string()
}

pub fn google_ytd_spec() -> QuerySpec {
    QuerySpec::new(vec!["GOOGL".to_string()], "ytd", Action::Plot)
}

pub fn success_outcome() -> ExecutionOutcome {
    ExecutionOutcome {
        exit_status: 0,
        stdout: "chart saved\n".to_string(),
        stderr: String::new(),
        exception: None,
    }
}

pub fn failure_outcome(exception: &str) -> ExecutionOutcome {
    ExecutionOutcome {
        exit_status: 1,
        stdout: String::new(),
        stderr: format!("Traceback (most recent call last):\n{exception}\n"),
        exception: Some(exception.to_string()),
    }
}
