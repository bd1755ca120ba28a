//! Subprocess-based sandbox
//!
//! Stages the code as a script in a private temporary directory and runs a
//! configured interpreter on it with a cleared environment, piped stdio, and
//! a hard wall-clock ceiling. The final exception line is extracted from
//! stderr so the executor can delegate a precise diagnostic.

use crate::{ExecutionOutcome, Sandbox, SandboxError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Terminal line of a Python traceback, e.g. `ModuleNotFoundError: ...`
/// or `socket.timeout: ...`.
static EXCEPTION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([A-Za-z_][A-Za-z0-9_.]*(?:Error|Exception|Interrupt|Exit|Warning)\b.*)$")
        .unwrap_or_else(|e| panic!("invalid exception pattern: {e}"))
});

/// Sandbox that executes code through an interpreter subprocess
#[derive(Debug, Clone)]
pub struct SubprocessSandbox {
    interpreter: PathBuf,
    time_limit: Duration,
}

impl SubprocessSandbox {
    /// Sandbox running `interpreter` with the given wall-clock ceiling
    #[inline]
    #[must_use]
    pub fn new(interpreter: impl Into<PathBuf>, time_limit: Duration) -> Self {
        Self {
            interpreter: interpreter.into(),
            time_limit,
        }
    }

    /// Python sandbox with a 60s ceiling
    #[inline]
    #[must_use]
    pub fn python() -> Self {
        Self::new("python3", Duration::from_secs(60))
    }

    /// Configured time ceiling
    #[inline]
    #[must_use]
    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }
}

#[async_trait]
impl Sandbox for SubprocessSandbox {
    async fn execute(&self, code: &str) -> Result<ExecutionOutcome, SandboxError> {
        let dir = tempfile::tempdir()?;
        let script = dir.path().join("artifact.py");
        tokio::fs::write(&script, code).await?;

        // Minimal environment: interpreter lookup only, no host secrets.
        let path = std::env::var("PATH").unwrap_or_default();

        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(&script)
            .current_dir(dir.path())
            .env_clear()
            .env("PATH", path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            interpreter = %self.interpreter.display(),
            limit_secs = self.time_limit.as_secs(),
            code_bytes = code.len(),
            "executing artifact in subprocess"
        );

        let output = tokio::time::timeout(self.time_limit, cmd.output())
            .await
            .map_err(|_| SandboxError::TimedOut {
                limit_secs: self.time_limit.as_secs(),
            })?
            .map_err(|e| SandboxError::Unavailable(format!("failed to spawn interpreter: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exception = extract_exception(&stderr);
        let exit_status = output.status.code().unwrap_or(-1);

        tracing::debug!(exit_status, has_exception = exception.is_some(), "subprocess finished");

        Ok(ExecutionOutcome {
            exit_status,
            stdout,
            stderr,
            exception,
        })
    }
}

/// Pull the last exception line out of interpreter stderr
fn extract_exception(stderr: &str) -> Option<String> {
    EXCEPTION_LINE
        .captures_iter(stderr)
        .last()
        .map(|c| c[1].trim().to_string())
}
