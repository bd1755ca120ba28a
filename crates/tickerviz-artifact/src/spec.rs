//! Structured query intent
//!
//! [`QuerySpec`] is the contract between query interpretation and code
//! synthesis: ticker symbols, a timeframe token, and the operation to
//! perform. The JSON schema derived from this type is what the inference
//! layer constrains the model backend against.

use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Recognized timeframe tokens (yfinance period vocabulary).
pub const TIMEFRAMES: &[&str] = &[
    "1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max",
];

static TIMEFRAME_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| TIMEFRAMES.iter().copied().collect());

/// Supported operations on the extracted symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Fetch market data and print a summary
    Fetch,
    /// Fetch market data and render a chart
    Plot,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Fetch => write!(f, "fetch"),
            Action::Plot => write!(f, "plot"),
        }
    }
}

impl FromStr for Action {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fetch" => Ok(Action::Fetch),
            "plot" => Ok(Action::Plot),
            other => Err(SpecError::UnknownAction(other.to_string())),
        }
    }
}

/// Validation errors for [`QuerySpec`]
///
/// Each variant names the violated field so interpreter feedback can point
/// the backend at what to fix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecError {
    /// `symbols` was empty
    #[error("field 'symbols': at least one ticker symbol is required")]
    EmptySymbols,

    /// A symbol contained characters outside the ticker alphabet
    #[error("field 'symbols': '{0}' is not a valid ticker symbol")]
    InvalidSymbol(String),

    /// `timeframe` was not in the recognized vocabulary
    #[error("field 'timeframe': '{0}' is not a recognized period (expected one of: 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max)")]
    UnknownTimeframe(String),

    /// `action` was not a supported operation
    #[error("field 'action': '{0}' is not a supported action (expected 'fetch' or 'plot')")]
    UnknownAction(String),
}

/// Validated structured intent extracted from a free-text request
///
/// # Invariants
/// After [`QuerySpec::normalize`] and a successful [`QuerySpec::validate`]:
/// - `symbols` is non-empty and every entry is uppercase ticker text
/// - `timeframe` is one of [`TIMEFRAMES`]
///
/// A spec that fails validation is never forwarded downstream. Once recorded
/// in a pipeline context the spec is immutable for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QuerySpec {
    /// Stock ticker symbols, e.g. `["TSLA", "AAPL"]`
    pub symbols: Vec<String>,
    /// Time period token, e.g. `"1d"`, `"1mo"`, `"ytd"`
    pub timeframe: String,
    /// Operation to perform on the symbols
    pub action: Action,
}

impl QuerySpec {
    /// Create a spec from raw parts (unvalidated)
    #[inline]
    #[must_use]
    pub fn new(
        symbols: Vec<String>,
        timeframe: impl Into<String>,
        action: Action,
    ) -> Self {
        Self {
            symbols,
            timeframe: timeframe.into(),
            action,
        }
    }

    /// Normalize in place: trim and uppercase symbols, lowercase the
    /// timeframe token, drop empty symbol entries.
    ///
    /// Idempotent: normalizing an already-normalized spec changes nothing.
    pub fn normalize(&mut self) {
        self.symbols = self
            .symbols
            .iter()
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        self.timeframe = self.timeframe.trim().to_ascii_lowercase();
    }

    /// Validate domain constraints not expressible in the raw JSON schema
    ///
    /// Pure check: does not mutate, and re-validating an already-valid spec
    /// is a no-op.
    ///
    /// # Errors
    /// Returns the first violated field:
    /// - [`SpecError::EmptySymbols`] if no symbols remain
    /// - [`SpecError::InvalidSymbol`] for non-ticker symbol text
    /// - [`SpecError::UnknownTimeframe`] for an unrecognized period token
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.symbols.is_empty() {
            return Err(SpecError::EmptySymbols);
        }
        for symbol in &self.symbols {
            if !is_ticker(symbol) {
                return Err(SpecError::InvalidSymbol(symbol.clone()));
            }
        }
        if !TIMEFRAME_SET.contains(self.timeframe.as_str()) {
            return Err(SpecError::UnknownTimeframe(self.timeframe.clone()));
        }
        Ok(())
    }
}

/// Ticker alphabet: leading letter, then letters/digits/dot/dash.
///
/// Covers common listings (`GOOGL`, `BRK.B`, `BTC-USD`).
fn is_ticker(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {}
        _ => return false,
    }
    s.len() <= 12
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.' || c == '-')
}
