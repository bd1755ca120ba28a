//! Sandbox for untrusted generated code
//!
//! The executor submits synthesized source text here and gets back an
//! [`ExecutionOutcome`]. The sandbox enforces its own resource/time ceiling
//! per execution, independent of any orchestrator-level timeout, since the
//! code it runs is untrusted input.

pub mod subprocess;

pub use subprocess::SubprocessSandbox;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of one sandbox invocation
///
/// Transient: consumed immediately by the executor to update the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Process exit status (`-1` if terminated by signal)
    pub exit_status: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Structured exception description, if one was detected
    pub exception: Option<String>,
}

impl ExecutionOutcome {
    /// Zero exit status and no captured exception
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_status == 0 && self.exception.is_none()
    }

    /// Best available diagnostic for a failed execution
    ///
    /// Prefers the extracted exception, then the stderr tail, then the bare
    /// exit status.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        if let Some(exception) = &self.exception {
            return exception.clone();
        }
        let tail: Vec<&str> = self
            .stderr
            .lines()
            .rev()
            .take(5)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        if !tail.is_empty() {
            return tail.join("\n");
        }
        format!("process exited with status {}", self.exit_status)
    }
}

/// Sandbox errors
///
/// A timed-out execution is reported separately from an unreachable sandbox:
/// the former is a property of the submitted code, the latter of the host.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// Sandbox could not be set up or the interpreter could not be spawned
    #[error("sandbox unavailable: {0}")]
    Unavailable(String),

    /// Execution exceeded the sandbox's own time ceiling
    #[error("execution exceeded the {limit_secs}s sandbox time limit")]
    TimedOut {
        /// The enforced ceiling
        limit_secs: u64,
    },

    /// Filesystem failure while staging the script
    #[error("sandbox io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Isolated execution environment for untrusted generated code
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Execute source code in isolation and report the outcome
    ///
    /// # Errors
    /// - [`SandboxError::TimedOut`] when the sandbox ceiling is exceeded
    /// - [`SandboxError::Unavailable`] when execution cannot even start
    async fn execute(&self, code: &str) -> Result<ExecutionOutcome, SandboxError>;
}

#[async_trait]
impl<S: Sandbox + ?Sized> Sandbox for std::sync::Arc<S> {
    async fn execute(&self, code: &str) -> Result<ExecutionOutcome, SandboxError> {
        (**self).execute(code).await
    }
}
