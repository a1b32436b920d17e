//! Retrieval error types.

use thiserror::Error;

/// Errors from embedding, index loading and retrieval.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("embedding backend error: {0}")]
    Embedding(String),

    #[error("embedder returned {actual} embeddings for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("invalid embedding index: {0}")]
    Index(String),
}
