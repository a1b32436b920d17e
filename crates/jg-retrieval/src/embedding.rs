//! Hybrid embeddings and the embedder abstraction.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::RetrievalError;

/// One text embedded in all three retrieval modalities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HybridEmbedding {
    /// Single dense vector for the whole text.
    #[serde(default)]
    pub dense: Vec<f32>,
    /// Lexical weight per token.
    #[serde(default)]
    pub sparse: HashMap<String, f32>,
    /// One vector per token (late-interaction representation).
    #[serde(default)]
    pub colbert: Vec<Vec<f32>>,
}

/// Text embedding backend producing hybrid embeddings.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Backend name, for logging.
    fn name(&self) -> &str;

    /// Embed a batch of texts, one embedding per input in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<HybridEmbedding>, RetrievalError>;

    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> Result<HybridEmbedding, RetrievalError> {
        let mut out = self.embed(&[text.to_string()]).await?;
        match out.len() {
            1 => Ok(out.remove(0)),
            actual => Err(RetrievalError::CountMismatch {
                expected: 1,
                actual,
            }),
        }
    }
}

/// Dimension of [`LexicalEmbedder`] vectors.
pub const LEXICAL_DIM: usize = 256;

/// Deterministic hashing embedder that needs no model.
///
/// Dense: hashed bag of words. Sparse: normalized term frequencies.
/// Multi-vector: one hashed one-hot-ish vector per token. Quality is far
/// below a real model but rankings are stable and purely lexical, which
/// makes it suitable for offline runs and tests.
#[derive(Debug, Clone)]
pub struct LexicalEmbedder {
    dim: usize,
}

impl LexicalEmbedder {
    pub fn new() -> Self {
        Self { dim: LEXICAL_DIM }
    }

    pub fn with_dim(dim: usize) -> Self {
        Self { dim: dim.max(8) }
    }

    /// Embed synchronously; the async trait method delegates here.
    pub fn embed_text(&self, text: &str) -> HybridEmbedding {
        let tokens = tokenize(text);

        let mut dense = vec![0.0f32; self.dim];
        let mut colbert = Vec::with_capacity(tokens.len());
        let mut counts: HashMap<String, f32> = HashMap::new();

        for token in &tokens {
            let mut vector = vec![0.0f32; self.dim];
            scatter(token, &mut vector);
            normalize(&mut vector);
            for (d, v) in dense.iter_mut().zip(&vector) {
                *d += v;
            }
            colbert.push(vector);
            *counts.entry(token.clone()).or_default() += 1.0;
        }
        normalize(&mut dense);

        let total = tokens.len().max(1) as f32;
        let sparse = counts.into_iter().map(|(t, c)| (t, c / total)).collect();

        HybridEmbedding {
            dense,
            sparse,
            colbert,
        }
    }
}

impl Default for LexicalEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for LexicalEmbedder {
    fn name(&self) -> &str {
        "lexical"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<HybridEmbedding>, RetrievalError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// Lower-cased alphanumeric tokens; camelCase and snake_case identifiers are
/// split so `switch_on` and `carbonDioxide` share tokens with prose.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if c.is_uppercase() && prev_lower && !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            prev_lower = c.is_lowercase() || c.is_numeric();
            current.extend(c.to_lowercase());
        } else {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            prev_lower = false;
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Buckets come from SHA-256 of the token, so a saved index stays valid
/// across builds and toolchains.
fn scatter(token: &str, vector: &mut [f32]) {
    let digest = Sha256::digest(token.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    let hash = u64::from_le_bytes(head);
    let dim = vector.len() as u64;

    vector[(hash % dim) as usize] += 1.0;
    vector[((hash >> 16) % dim) as usize] += 0.5;
    vector[((hash >> 32) % dim) as usize] += 0.25;
}

fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}
