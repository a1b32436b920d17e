//! Vocabulary loading error types.

use thiserror::Error;

/// Errors raised while loading or querying the device vocabulary.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("duplicate device class: {0}")]
    DuplicateClass(String),

    #[error("mandatory device class missing from vocabulary: {0}")]
    MissingClass(String),
}

/// Convenience alias for vocabulary results.
pub type CatalogResult<T> = Result<T, CatalogError>;
