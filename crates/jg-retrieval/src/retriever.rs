//! Ranking device classes against a request sentence.

use std::collections::BTreeSet;

use jg_catalog::Vocabulary;
use serde::{Deserialize, Serialize};

use crate::embedding::{Embedder, HybridEmbedding};
use crate::error::RetrievalError;
use crate::index::EmbeddingIndex;
use crate::scoring::{FusionWeights, SignalScores};

/// Retrieval tuning, loadable from the `[retrieval]` config table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Classes kept after the site filter.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub weights: FusionWeights,
    /// Fused scores below this are discarded even inside the top-K.
    #[serde(default)]
    pub min_score: Option<f32>,
}

fn default_top_k() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            weights: FusionWeights::default(),
            min_score: None,
        }
    }
}

/// A device class with its fused relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredClass {
    pub key: String,
    pub score: f32,
    pub signals: SignalScores,
}

/// Dense + sparse + multi-vector retriever over an [`EmbeddingIndex`].
#[derive(Debug, Clone, Default)]
pub struct HybridRetriever {
    config: RetrievalConfig,
}

impl HybridRetriever {
    pub fn new(config: RetrievalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Score every indexed vocabulary class, best first.
    ///
    /// The sort is stable, so equal scores keep vocabulary order.
    pub fn rank(
        &self,
        query: &HybridEmbedding,
        index: &EmbeddingIndex,
        vocabulary: &Vocabulary,
    ) -> Vec<ScoredClass> {
        let mut ranked: Vec<ScoredClass> = vocabulary
            .keys()
            .filter_map(|key| {
                let doc = index.get(key)?;
                let signals = SignalScores::compute(query, doc);
                Some(ScoredClass {
                    key: key.to_string(),
                    score: signals.fuse(&self.config.weights),
                    signals,
                })
            })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }

    /// Keep the best `top_k` classes that are connected on site.
    ///
    /// The site filter is applied after ranking; unavailable classes are
    /// scored but never selected.
    pub fn select(
        &self,
        ranked: Vec<ScoredClass>,
        available: &BTreeSet<String>,
    ) -> Vec<ScoredClass> {
        ranked
            .into_iter()
            .filter(|c| available.contains(&c.key))
            .filter(|c| self.config.min_score.is_none_or(|min| c.score >= min))
            .take(self.config.top_k)
            .collect()
    }

    /// Embed `query` and return the top site-available classes.
    pub async fn retrieve(
        &self,
        embedder: &dyn Embedder,
        query: &str,
        index: &EmbeddingIndex,
        vocabulary: &Vocabulary,
        available: &BTreeSet<String>,
    ) -> Result<Vec<ScoredClass>, RetrievalError> {
        let embedding = embedder.embed_one(query).await?;
        let ranked = self.rank(&embedding, index, vocabulary);

        for class in ranked.iter().take(10) {
            tracing::debug!(
                class = %class.key,
                score = class.score,
                dense = class.signals.dense,
                sparse = class.signals.sparse,
                colbert = class.signals.colbert,
                "retrieval score"
            );
        }

        let selected = self.select(ranked, available);
        tracing::info!(
            selected = ?selected.iter().map(|c| c.key.as_str()).collect::<Vec<_>>(),
            available = available.len(),
            "device classes retrieved"
        );
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::LexicalEmbedder;
    use crate::index::IndexEntry;
    use jg_catalog::parse_service_list;

    fn vocab(keys: &[&str]) -> Vocabulary {
        let text = keys
            .iter()
            .map(|k| format!("Device {k}:\n    \"\"\"\n    Tags:\n    #{k}\n    \"\"\"\n"))
            .collect::<String>();
        parse_service_list(&text).unwrap()
    }

    fn dense_index(entries: &[(&str, [f32; 2])]) -> EmbeddingIndex {
        EmbeddingIndex::new(
            "test",
            entries
                .iter()
                .map(|(k, v)| IndexEntry {
                    key: k.to_string(),
                    embedding: HybridEmbedding {
                        dense: v.to_vec(),
                        ..Default::default()
                    },
                })
                .collect(),
        )
    }

    fn query(v: [f32; 2]) -> HybridEmbedding {
        HybridEmbedding {
            dense: v.to_vec(),
            ..Default::default()
        }
    }

    fn available(keys: &[&str]) -> BTreeSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn rank_orders_by_fused_score() {
        let vocab = vocab(&["A", "B", "C"]);
        let index = dense_index(&[("A", [0.0, 1.0]), ("B", [1.0, 0.0]), ("C", [1.0, 1.0])]);
        let ranked = HybridRetriever::default().rank(&query([1.0, 0.0]), &index, &vocab);
        let keys: Vec<_> = ranked.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["B", "C", "A"]);
    }

    #[test]
    fn ties_keep_vocabulary_order() {
        let vocab = vocab(&["Z", "Y", "X"]);
        let index = dense_index(&[("X", [1.0, 0.0]), ("Y", [1.0, 0.0]), ("Z", [1.0, 0.0])]);
        let ranked = HybridRetriever::default().rank(&query([1.0, 0.0]), &index, &vocab);
        let keys: Vec<_> = ranked.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["Z", "Y", "X"]);
    }

    #[test]
    fn site_filter_is_hard() {
        let vocab = vocab(&["A", "B", "C"]);
        let index = dense_index(&[("A", [1.0, 0.0]), ("B", [0.9, 0.1]), ("C", [0.0, 1.0])]);
        let retriever = HybridRetriever::default();
        let ranked = retriever.rank(&query([1.0, 0.0]), &index, &vocab);
        let selected = retriever.select(ranked, &available(&["C"]));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].key, "C");
    }

    #[test]
    fn top_k_and_min_score() {
        let vocab = vocab(&["A", "B", "C"]);
        let index = dense_index(&[("A", [1.0, 0.0]), ("B", [0.7, 0.7]), ("C", [0.0, 1.0])]);
        let all = available(&["A", "B", "C"]);

        let retriever = HybridRetriever::new(RetrievalConfig {
            top_k: 2,
            ..Default::default()
        });
        let ranked = retriever.rank(&query([1.0, 0.0]), &index, &vocab);
        assert_eq!(retriever.select(ranked, &all).len(), 2);

        let retriever = HybridRetriever::new(RetrievalConfig {
            top_k: 5,
            min_score: Some(0.2),
            ..Default::default()
        });
        let ranked = retriever.rank(&query([1.0, 0.0]), &index, &vocab);
        let keys: Vec<_> = retriever
            .select(ranked, &all)
            .into_iter()
            .map(|c| c.key)
            .collect();
        // C is orthogonal: dense score 0 falls under the floor.
        assert_eq!(keys, vec!["A", "B"]);
    }

    #[test]
    fn unindexed_classes_are_skipped() {
        let vocab = vocab(&["A", "B"]);
        let index = dense_index(&[("A", [1.0, 0.0])]);
        let ranked = HybridRetriever::default().rank(&query([1.0, 0.0]), &index, &vocab);
        assert_eq!(ranked.len(), 1);
    }

    #[tokio::test]
    async fn retrieve_with_lexical_embedder() {
        let text = r#"Device Light:
    """
    Tags:
    #Light
    Methods:
      switch_on() -> VOID  # turn the light on
    """
Device Window:
    """
    Tags:
    #Window
    Methods:
      windowControl_open() -> VOID  # open the window
    """
"#;
        let vocab = parse_service_list(text).unwrap();
        let embedder = LexicalEmbedder::new();
        let index = EmbeddingIndex::build(&vocab, &embedder).await.unwrap();
        let retriever = HybridRetriever::new(RetrievalConfig {
            top_k: 1,
            ..Default::default()
        });

        let selected = retriever
            .retrieve(
                &embedder,
                "turn on the light",
                &index,
                &vocab,
                &available(&["Light", "Window"]),
            )
            .await
            .unwrap();
        assert_eq!(selected[0].key, "Light");

        let selected = retriever
            .retrieve(
                &embedder,
                "open the window",
                &index,
                &vocab,
                &available(&["Light", "Window"]),
            )
            .await
            .unwrap();
        assert_eq!(selected[0].key, "Window");
    }
}
