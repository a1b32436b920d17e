//! Precomputed per-class embeddings.
//!
//! Built offline (or at startup) by embedding every class document, then
//! served read-only from memory for the lifetime of the process.

use std::collections::HashMap;
use std::path::Path;

use jg_catalog::Vocabulary;
use serde::{Deserialize, Serialize};

use crate::embedding::{Embedder, HybridEmbedding};
use crate::error::RetrievalError;

/// Embedding of one device class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub key: String,
    #[serde(flatten)]
    pub embedding: HybridEmbedding,
}

/// Device-class embeddings keyed by class key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingIndex {
    /// Embedder that produced the entries; queries must use the same one.
    pub model: String,
    entries: Vec<IndexEntry>,
    #[serde(skip)]
    lookup: HashMap<String, usize>,
}

impl EmbeddingIndex {
    pub fn new(model: impl Into<String>, entries: Vec<IndexEntry>) -> Self {
        let mut index = Self {
            model: model.into(),
            entries,
            lookup: HashMap::new(),
        };
        index.reindex();
        index
    }

    fn reindex(&mut self) {
        self.lookup = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.key.clone(), i))
            .collect();
    }

    /// Embed every class document of `vocabulary`.
    pub async fn build(
        vocabulary: &Vocabulary,
        embedder: &dyn Embedder,
    ) -> Result<Self, RetrievalError> {
        let docs: Vec<String> = vocabulary.iter().map(|c| c.doc.clone()).collect();
        let embeddings = embedder.embed(&docs).await?;
        if embeddings.len() != docs.len() {
            return Err(RetrievalError::CountMismatch {
                expected: docs.len(),
                actual: embeddings.len(),
            });
        }

        let entries = vocabulary
            .keys()
            .zip(embeddings)
            .map(|(key, embedding)| IndexEntry {
                key: key.to_string(),
                embedding,
            })
            .collect();

        tracing::info!(
            embedder = embedder.name(),
            classes = vocabulary.len(),
            "embedding index built"
        );
        Ok(Self::new(embedder.name(), entries))
    }

    /// Load an index previously written by [`EmbeddingIndex::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RetrievalError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| RetrievalError::Io(format!("{}: {e}", path.display())))?;
        let mut index: Self = serde_json::from_str(&text)
            .map_err(|e| RetrievalError::Index(format!("{}: {e}", path.display())))?;
        index.reindex();
        if index.lookup.len() != index.entries.len() {
            return Err(RetrievalError::Index(format!(
                "{}: duplicate class keys",
                path.display()
            )));
        }
        Ok(index)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RetrievalError> {
        let path = path.as_ref();
        let json =
            serde_json::to_string(self).map_err(|e| RetrievalError::Index(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| RetrievalError::Io(format!("{}: {e}", path.display())))
    }

    pub fn get(&self, key: &str) -> Option<&HybridEmbedding> {
        self.lookup.get(key).map(|&i| &self.entries[i].embedding)
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Vocabulary classes that have no embedding in this index.
    pub fn missing<'v>(&self, vocabulary: &'v Vocabulary) -> Vec<&'v str> {
        vocabulary
            .keys()
            .filter(|k| !self.lookup.contains_key(*k))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
