//! Hybrid device-class retrieval.
//!
//! Every device class is embedded offline in three modalities (a dense
//! vector, sparse lexical weights and token-level multi-vectors). At request
//! time the translated sentence is embedded the same way, the three
//! similarities are fused with fixed weights, and the best-scoring classes
//! that are actually connected on site are offered to the generator.

pub mod embedding;
pub mod error;
pub mod index;
pub mod retriever;
pub mod scoring;
pub mod selection;

pub use embedding::{Embedder, HybridEmbedding, LexicalEmbedder};
pub use error::RetrievalError;
pub use index::EmbeddingIndex;
pub use retriever::{HybridRetriever, RetrievalConfig, ScoredClass};
pub use scoring::{FusionWeights, SignalScores};
pub use selection::{RetrievalResult, SelectedService, select_services};
