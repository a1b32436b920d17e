//! Scenario parsing error types.

use thiserror::Error;

/// Structural errors in scenario text. Line numbers are 1-based and relative
/// to the parsed block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
    #[error("no scenarios in input")]
    Empty,

    #[error("line {line}: missing `{key}` header")]
    MissingHeader { line: usize, key: &'static str },

    #[error("line {line}: malformed header `{text}`")]
    MalformedHeader { line: usize, text: String },

    #[error("line {line}: unexpected header `{found}`, expected `{expected}`")]
    UnexpectedKey {
        line: usize,
        found: String,
        expected: &'static str,
    },

    #[error("line {line}: period must be an integer, got `{value}`")]
    InvalidPeriod { line: usize, value: String },
}

/// Convenience alias for scenario results.
pub type ScenarioResult<T> = Result<T, ScenarioError>;
