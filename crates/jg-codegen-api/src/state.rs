//! Shared application state for the Axum server.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use jg_catalog::Vocabulary;
use jg_protocol::api::DEFAULT_SITE_ID;
use jg_retrieval::{EmbeddingIndex, select_services};
use jg_scenario::ValidatorConfig;

use crate::config::ApiConfig;
use crate::pipeline::{CodegenPipeline, PipelineOptions, Resources, Services};
use crate::services;
use crate::site_store::SiteStore;

/// Classes every vocabulary must define.
const MANDATORY_CLASSES: &[&str] = &[jg_retrieval::selection::CLOCK];

/// Shared application state, cheap to clone into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<CodegenPipeline>,
    pub sites: SiteStore,
}

impl AppState {
    pub fn new(pipeline: CodegenPipeline, sites: SiteStore) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            sites,
        }
    }

    /// Load resources and wire services as described by `config`.
    pub async fn from_config(config: &ApiConfig) -> anyhow::Result<Self> {
        let vocabulary = Vocabulary::load(&config.resources.vocabulary)
            .with_context(|| format!("loading vocabulary {}", config.resources.vocabulary))?;
        vocabulary.require(MANDATORY_CLASSES)?;
        check_virtual_classes(&vocabulary, &config.validator);

        let grammar = std::fs::read_to_string(&config.resources.grammar)
            .with_context(|| format!("loading grammar {}", config.resources.grammar))?;

        let embedder = services::embedder_from_config(config)?;
        let index = match &config.resources.embedding_index {
            Some(path) => EmbeddingIndex::load(path)?,
            None => EmbeddingIndex::build(&vocabulary, embedder.as_ref()).await?,
        };
        if index.model != embedder.name() {
            tracing::warn!(
                index = %index.model,
                embedder = embedder.name(),
                "embedding index was built with a different embedder"
            );
        }
        let missing = index.missing(&vocabulary);
        if !missing.is_empty() {
            tracing::warn!(?missing, "device classes without embeddings are never retrieved");
        }

        let sites = match &config.resources.default_site {
            Some(path) => {
                let devices = SiteStore::load_site_file(path)
                    .with_context(|| format!("loading default site {path}"))?;
                tracing::info!(devices = devices.len(), "default site loaded");
                SiteStore::with_site(DEFAULT_SITE_ID, devices)
            }
            None => SiteStore::new(),
        };

        let pipeline = CodegenPipeline::new(
            Resources {
                vocabulary,
                index,
                grammar,
            },
            Services {
                translator: services::translator_from_config(config)?,
                embedder,
                generator: services::generator_from_config(config)?,
            },
            PipelineOptions {
                retrieval: config.retrieval.clone(),
                validator: config.validator.clone(),
                grammar_variant: config.grammar_variant,
                max_concurrency: config.generator.max_concurrency,
            },
        );

        Ok(Self::new(pipeline, sites))
    }
}

/// Embed every class in the configured vocabulary and write the index to
/// `out`, for later use as `resources.embedding_index`.
pub async fn build_index(
    config: &ApiConfig,
    out: impl AsRef<Path>,
) -> anyhow::Result<EmbeddingIndex> {
    let out = out.as_ref();
    let vocabulary = Vocabulary::load(&config.resources.vocabulary)
        .with_context(|| format!("loading vocabulary {}", config.resources.vocabulary))?;
    let embedder = services::embedder_from_config(config)?;
    let index = EmbeddingIndex::build(&vocabulary, embedder.as_ref()).await?;
    index
        .save(out)
        .with_context(|| format!("writing embedding index {}", out.display()))?;
    tracing::info!(
        classes = index.len(),
        model = %index.model,
        path = %out.display(),
        "embedding index written"
    );
    Ok(index)
}

/// Warn about configured virtual classes the vocabulary does not define, and
/// about a Speaker class that cannot produce the speech stub.
fn check_virtual_classes(vocabulary: &Vocabulary, validator: &ValidatorConfig) {
    for class in &validator.virtual_classes {
        if !vocabulary.contains(class) {
            tracing::warn!(class = %class, "virtual class not in vocabulary");
        }
    }
    let probe = select_services(&[], vocabulary);
    if vocabulary.contains(jg_retrieval::selection::SPEAKER)
        && !probe.contains(jg_retrieval::selection::SPEAKER)
    {
        tracing::warn!("Speaker class has no Enums section, speech stub disabled");
    }
}
