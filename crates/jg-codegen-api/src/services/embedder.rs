//! HTTP client for a hybrid embedding sidecar (BGE-M3 style).
//!
//! The sidecar accepts `POST {url}/embed` with `{"texts": [...]}` and
//! returns parallel arrays, one element per input text:
//!
//! ```json
//! {"dense": [[...]], "sparse": [{"token": 0.3}], "colbert": [[[...]]]}
//! ```

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use jg_retrieval::{Embedder, HybridEmbedding, RetrievalError};
use serde::{Deserialize, Serialize};

/// Which embedder backs retrieval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderBackend {
    /// Remote model sidecar.
    Http,
    /// Built-in hashing embedder; needs no model.
    #[default]
    Lexical,
}

/// Configuration for the `[embedder]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedderConfig {
    #[serde(default)]
    pub backend: EmbedderBackend,
    #[serde(default = "default_url")]
    pub url: String,
    /// Name recorded in the embedding index built with this embedder.
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    "http://localhost:8001".into()
}
fn default_model() -> String {
    "bge-m3".into()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            backend: EmbedderBackend::default(),
            url: default_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    dense: Vec<Vec<f32>>,
    #[serde(default)]
    sparse: Vec<HashMap<String, f32>>,
    #[serde(default)]
    colbert: Vec<Vec<Vec<f32>>>,
}

/// [`Embedder`] backed by the embedding sidecar.
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: EmbedderConfig,
}

impl HttpEmbedder {
    pub fn new(config: EmbedderConfig) -> Result<Self, crate::error::ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<HybridEmbedding>, RetrievalError> {
        let url = format!("{}/embed", self.config.url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest { texts })
            .send()
            .await
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Embedding(format!(
                "embedding service returned {status}"
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        if body.dense.len() != texts.len() {
            return Err(RetrievalError::CountMismatch {
                expected: texts.len(),
                actual: body.dense.len(),
            });
        }

        let mut sparse = body.sparse.into_iter();
        let mut colbert = body.colbert.into_iter();
        Ok(body
            .dense
            .into_iter()
            .map(|dense| HybridEmbedding {
                dense,
                sparse: sparse.next().unwrap_or_default(),
                colbert: colbert.next().unwrap_or_default(),
            })
            .collect())
    }
}
