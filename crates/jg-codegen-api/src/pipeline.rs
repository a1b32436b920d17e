//! End-to-end code generation: translate, resolve site tags, retrieve device
//! classes, prompt the generator, then parse and validate its output.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jg_catalog::{Vocabulary, resolve_tags};
use jg_protocol::api::{GenerateResponse, GenerationLog, format_seconds};
use jg_protocol::device::ConnectedDevices;
use jg_protocol::scenario::ScenarioRecord;
use jg_retrieval::{Embedder, EmbeddingIndex, HybridRetriever, RetrievalConfig, select_services};
use jg_scenario::{
    GrammarVariant, Validator, ValidatorConfig, extract_last_fenced_block, parse_scenarios,
};
use serde_json::{Map, Value};
use tokio::sync::Semaphore;

use crate::error::PipelineError;
use crate::prompt::Prompt;
use crate::services::{Generator, Translator};

/// Immutable data shared by every request.
pub struct Resources {
    pub vocabulary: Vocabulary,
    pub index: EmbeddingIndex,
    pub grammar: String,
}

/// External collaborators.
pub struct Services {
    pub translator: Arc<dyn Translator>,
    pub embedder: Arc<dyn Embedder>,
    pub generator: Arc<dyn Generator>,
}

/// Tuning knobs, usually taken from [`crate::config::ApiConfig`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub retrieval: RetrievalConfig,
    pub validator: ValidatorConfig,
    pub grammar_variant: GrammarVariant,
    pub max_concurrency: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            retrieval: RetrievalConfig::default(),
            validator: ValidatorConfig::default(),
            grammar_variant: GrammarVariant::default(),
            max_concurrency: 1,
        }
    }
}

/// One generation request after HTTP-level validation.
#[derive(Debug, Clone)]
pub struct GenerationInput {
    pub sentence: String,
    /// Request time, already checked to be a valid timestamp.
    pub current_time: String,
    pub connected: ConnectedDevices,
    pub other_params: Option<Map<String, Value>>,
}

pub struct CodegenPipeline {
    resources: Resources,
    services: Services,
    retriever: HybridRetriever,
    validator: Validator,
    variant: GrammarVariant,
    /// Admission control for the generator backend.
    permits: Semaphore,
}

impl CodegenPipeline {
    pub fn new(resources: Resources, services: Services, options: PipelineOptions) -> Self {
        Self {
            resources,
            services,
            retriever: HybridRetriever::new(options.retrieval),
            validator: Validator::new(options.validator),
            variant: options.grammar_variant,
            permits: Semaphore::new(options.max_concurrency.max(1)),
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.resources.vocabulary
    }

    pub async fn run(&self, input: GenerationInput) -> Result<GenerateResponse, PipelineError> {
        let start = Instant::now();

        let translated = self.translate(&input.sentence).await;

        let site = resolve_tags(&input.connected, &self.resources.vocabulary);
        let annotated = self.resources.vocabulary.annotated(&site.tag_device);
        tracing::info!(
            devices = input.connected.len(),
            classes = site.tag_device.len(),
            "site tags resolved"
        );

        let retrieved = self
            .retriever
            .retrieve(
                self.services.embedder.as_ref(),
                &translated,
                &self.resources.index,
                &self.resources.vocabulary,
                &site.available_classes(),
            )
            .await?;
        let selection = select_services(&retrieved, &annotated);

        let prompt = Prompt::build(
            &self.resources.grammar,
            &selection.service_doc(),
            &input.current_time,
            &translated,
            input.other_params.as_ref(),
        );

        let (output, inference_time) = self.generate(&prompt).await?;
        let scenarios = self.parse_output(&output);

        let mut kept = Vec::with_capacity(scenarios.len());
        for mut scenario in scenarios {
            let code = self.validator.validate(&scenario.code, &annotated, &site);
            if code.trim().is_empty() {
                tracing::warn!(scenario = %scenario.name, "scenario dropped after validation");
                continue;
            }
            scenario.code = code;
            kept.push(scenario);
        }

        let response_time = start.elapsed();
        tracing::info!(
            scenarios = kept.len(),
            response_ms = response_time.as_millis() as u64,
            inference_ms = inference_time.as_millis() as u64,
            "generation complete"
        );

        Ok(GenerateResponse {
            code: kept,
            log: GenerationLog {
                response_time: format_seconds(response_time),
                inference_time: format_seconds(inference_time),
                translated_sentence: translated,
                mapped_devices: selection.keys(),
            },
        })
    }

    /// Translated sentence, or the original when translation fails.
    async fn translate(&self, sentence: &str) -> String {
        match self.services.translator.translate(sentence).await {
            Ok(translated) if !translated.trim().is_empty() => {
                tracing::info!(
                    translator = self.services.translator.name(),
                    translated = %translated,
                    "sentence translated"
                );
                translated
            }
            Ok(_) => sentence.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "translation failed, using original sentence");
                sentence.to_string()
            }
        }
    }

    async fn generate(&self, prompt: &Prompt) -> Result<(String, Duration), PipelineError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| PipelineError::Closed)?;

        let started = Instant::now();
        let output = self
            .services
            .generator
            .generate(prompt)
            .await
            .map_err(PipelineError::Generation)?;
        let elapsed = started.elapsed();

        tracing::info!(
            generator = self.services.generator.name(),
            latency_ms = elapsed.as_millis() as u64,
            "generator responded"
        );
        tracing::debug!(output = %output, "raw generator output");
        Ok((output, elapsed))
    }

    /// Fenced block first, then the raw text, then a single empty
    /// placeholder that validation will drop.
    fn parse_output(&self, output: &str) -> Vec<ScenarioRecord> {
        if let Some(block) = extract_last_fenced_block(output) {
            match parse_scenarios(&block, self.variant) {
                Ok(records) => return records,
                Err(e) => tracing::debug!(error = %e, "fenced block did not parse"),
            }
        }
        match parse_scenarios(output, self.variant) {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "generator output did not parse");
                vec![ScenarioRecord::placeholder()]
            }
        }
    }
}
