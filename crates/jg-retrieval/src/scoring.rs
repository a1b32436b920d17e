//! Per-modality similarity and score fusion.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::embedding::HybridEmbedding;

/// Weights of the three signals in the fused score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    #[serde(default = "default_dense")]
    pub dense: f32,
    #[serde(default = "default_sparse")]
    pub sparse: f32,
    #[serde(default = "default_colbert")]
    pub colbert: f32,
}

fn default_dense() -> f32 {
    0.4
}
fn default_sparse() -> f32 {
    0.2
}
fn default_colbert() -> f32 {
    0.4
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            dense: default_dense(),
            sparse: default_sparse(),
            colbert: default_colbert(),
        }
    }
}

/// Similarity of one query/document pair in each modality.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SignalScores {
    pub dense: f32,
    pub sparse: f32,
    pub colbert: f32,
}

impl SignalScores {
    pub fn compute(query: &HybridEmbedding, doc: &HybridEmbedding) -> Self {
        Self {
            dense: cosine(&query.dense, &doc.dense),
            sparse: lexical_overlap(&query.sparse, &doc.sparse),
            colbert: max_sim(&query.colbert, &doc.colbert),
        }
    }

    pub fn fuse(&self, weights: &FusionWeights) -> f32 {
        weights.dense * self.dense + weights.sparse * self.sparse + weights.colbert * self.colbert
    }
}

/// Cosine similarity; 0 for mismatched or zero-length vectors.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let norm_a = dot(a, a).sqrt();
    let norm_b = dot(b, b).sqrt();
    if norm_a > 0.0 && norm_b > 0.0 {
        dot(a, b) / (norm_a * norm_b)
    } else {
        0.0
    }
}

/// Sum of weight products over tokens present in both maps.
pub fn lexical_overlap(query: &HashMap<String, f32>, doc: &HashMap<String, f32>) -> f32 {
    let (small, large) = if query.len() <= doc.len() {
        (query, doc)
    } else {
        (doc, query)
    };
    small
        .iter()
        .filter_map(|(token, w)| large.get(token).map(|v| w * v))
        .sum()
}

/// Late-interaction score: for each query token the best-matching document
/// token, averaged over query tokens.
pub fn max_sim(query: &[Vec<f32>], doc: &[Vec<f32>]) -> f32 {
    if query.is_empty() || doc.is_empty() {
        return 0.0;
    }
    let total: f32 = query
        .iter()
        .map(|q| {
            doc.iter()
                .filter(|d| d.len() == q.len())
                .map(|d| dot(q, d))
                .fold(0.0f32, f32::max)
        })
        .sum();
    total / query.len() as f32
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_basics() {
        assert!((cosine(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine(&[], &[]), 0.0);
    }

    #[test]
    fn lexical_overlap_uses_shared_tokens_only() {
        let q: HashMap<String, f32> = [("light".into(), 0.5), ("on".into(), 0.2)].into();
        let d: HashMap<String, f32> = [("light".into(), 0.4), ("window".into(), 0.9)].into();
        assert!((lexical_overlap(&q, &d) - 0.2).abs() < 1e-6);
        assert_eq!(lexical_overlap(&q, &HashMap::new()), 0.0);
    }

    #[test]
    fn max_sim_averages_best_matches() {
        let q = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let d = vec![vec![1.0, 0.0], vec![0.6, 0.8]];
        // token 1 best = 1.0, token 2 best = 0.8
        assert!((max_sim(&q, &d) - 0.9).abs() < 1e-6);
        assert_eq!(max_sim(&[], &d), 0.0);
        assert_eq!(max_sim(&q, &[]), 0.0);
    }

    #[test]
    fn fuse_is_weighted_sum() {
        let s = SignalScores {
            dense: 0.5,
            sparse: 1.0,
            colbert: 0.25,
        };
        let w = FusionWeights::default();
        assert!((s.fuse(&w) - (0.2 + 0.2 + 0.1)).abs() < 1e-6);
    }

    #[test]
    fn weights_from_partial_config() {
        let w: FusionWeights = serde_json::from_str(r#"{"sparse": 0.0}"#).unwrap();
        assert_eq!(w.dense, 0.4);
        assert_eq!(w.sparse, 0.0);
        assert_eq!(w.colbert, 0.4);
    }
}
