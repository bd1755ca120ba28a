//! Pipeline configuration

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;

// Safe: 3 is non-zero.
const DEFAULT_MAX_ATTEMPTS: NonZeroU32 = match NonZeroU32::new(3) {
    Some(n) => n,
    None => unreachable!(),
};

/// Configuration for one pipeline instance
///
/// `max_attempts` is a [`NonZeroU32`]: the repair loop bound is finite and
/// positive by construction, so an unbounded loop cannot be configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Total synthesis attempts permitted per run (first + repairs)
    pub max_attempts: NonZeroU32,
    /// Additional interpretation attempts after a schema violation
    pub interpreter_retries: u32,
    /// Timeout for each model backend call, in seconds
    pub backend_timeout_secs: u64,
    /// Sandbox wall-clock ceiling per execution, in seconds
    pub sandbox_time_limit_secs: u64,
}

impl PipelineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With repair-loop bound
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: NonZeroU32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// With interpreter retry count
    #[inline]
    #[must_use]
    pub fn with_interpreter_retries(mut self, retries: u32) -> Self {
        self.interpreter_retries = retries;
        self
    }

    /// With backend timeout
    #[inline]
    #[must_use]
    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout_secs = timeout.as_secs();
        self
    }

    /// With sandbox time ceiling
    #[inline]
    #[must_use]
    pub fn with_sandbox_time_limit(mut self, limit: Duration) -> Self {
        self.sandbox_time_limit_secs = limit.as_secs();
        self
    }

    /// Backend timeout as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs)
    }

    /// Sandbox ceiling as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn sandbox_time_limit(&self) -> Duration {
        Duration::from_secs(self.sandbox_time_limit_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interpreter_retries: 2,
            backend_timeout_secs: 120,
            sandbox_time_limit_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_bounded() {
        let config = PipelineConfig::new();
        assert_eq!(config.max_attempts.get(), 3);
        assert_eq!(config.interpreter_retries, 2);
    }

    #[test]
    fn builder_chain() {
        let config = PipelineConfig::new()
            .with_max_attempts(NonZeroU32::new(2).unwrap())
            .with_interpreter_retries(1)
            .with_backend_timeout(Duration::from_secs(30))
            .with_sandbox_time_limit(Duration::from_secs(10));

        assert_eq!(config.max_attempts.get(), 2);
        assert_eq!(config.interpreter_retries, 1);
        assert_eq!(config.backend_timeout(), Duration::from_secs(30));
        assert_eq!(config.sandbox_time_limit(), Duration::from_secs(10));
    }

    #[test]
    fn zero_max_attempts_unrepresentable() {
        assert!(NonZeroU32::new(0).is_none());
    }
}
