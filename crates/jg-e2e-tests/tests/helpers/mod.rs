//! Shared test harness for E2E integration tests.
//!
//! Builds the real router over the shipped `resources/` files, with the
//! language model replaced by a scripted generator.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use jg_catalog::Vocabulary;
use jg_codegen_api::error::ServiceError;
use jg_codegen_api::pipeline::{CodegenPipeline, PipelineOptions, Resources, Services};
use jg_codegen_api::prompt::Prompt;
use jg_codegen_api::routes::build_router;
use jg_codegen_api::services::{Generator, PassthroughTranslator, Translator};
use jg_codegen_api::site_store::SiteStore;
use jg_codegen_api::state::AppState;
use jg_protocol::api::DEFAULT_SITE_ID;
use jg_retrieval::{EmbeddingIndex, LexicalEmbedder, RetrievalConfig};

/// Path of a file under the workspace `resources/` directory.
pub fn resource(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../resources")
        .join(name)
}

/// Generator that replays queued replies and records every prompt.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, ServiceError>>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a reply for the next call.
    pub fn reply(&self, text: &str) -> &Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    /// Queue a backend failure for the next call.
    pub fn fail(&self, status: u16, body: &str) -> &Self {
        self.replies.lock().unwrap().push_back(Err(ServiceError::Status {
            status,
            body: body.to_string(),
        }));
        self
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Prompt {
        self.prompts().pop().expect("generator was never called")
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<String, ServiceError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ServiceError::Empty))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Translator backed by a fixed phrase book. Unknown phrases fail.
pub struct PhraseBook(pub HashMap<String, String>);

impl PhraseBook {
    pub fn new<const N: usize>(entries: [(&str, &str); N]) -> Arc<Self> {
        Arc::new(Self(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ))
    }
}

#[async_trait]
impl Translator for PhraseBook {
    async fn translate(&self, text: &str) -> Result<String, ServiceError> {
        self.0.get(text).cloned().ok_or(ServiceError::Status {
            status: 456,
            body: "Quota exceeded".into(),
        })
    }

    fn name(&self) -> &str {
        "phrase-book"
    }
}

/// End-to-end test harness over the real router and resources.
pub struct TestHarness {
    pub state: AppState,
    pub router: Router,
}

impl TestHarness {
    /// Harness with a passthrough translator and the shipped default site.
    pub async fn new(generator: Arc<dyn Generator>) -> Self {
        Self::with_translator(Arc::new(PassthroughTranslator), generator).await
    }

    pub async fn with_translator(
        translator: Arc<dyn Translator>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self::with_services(translator, generator, PipelineOptions {
            // Offer every connected class so assertions do not depend on
            // lexical ranking.
            retrieval: RetrievalConfig {
                top_k: 32,
                ..RetrievalConfig::default()
            },
            ..PipelineOptions::default()
        })
        .await
    }

    pub async fn with_services(
        translator: Arc<dyn Translator>,
        generator: Arc<dyn Generator>,
        options: PipelineOptions,
    ) -> Self {
        let vocabulary = Vocabulary::load(resource("service_list.txt")).unwrap();
        let grammar = std::fs::read_to_string(resource("grammar.txt")).unwrap();
        let embedder = Arc::new(LexicalEmbedder::new());
        let index = EmbeddingIndex::build(&vocabulary, embedder.as_ref())
            .await
            .unwrap();
        let devices = SiteStore::load_site_file(resource("default_site.json")).unwrap();

        let pipeline = CodegenPipeline::new(
            Resources {
                vocabulary,
                index,
                grammar,
            },
            Services {
                translator,
                embedder,
                generator,
            },
            options,
        );
        let state = AppState::new(pipeline, SiteStore::with_site(DEFAULT_SITE_ID, devices));
        let router = build_router(state.clone());
        Self { state, router }
    }

    /// POST /generate_joi_code. Returns (HTTP status code, response JSON body).
    pub async fn generate(&self, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::post("/generate_joi_code")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, json)
    }

    /// Generate for `sentence` on the default site with its remembered devices.
    pub async fn generate_sentence(&self, sentence: &str) -> (StatusCode, serde_json::Value) {
        self.generate(serde_json::json!({
            "sentence": sentence,
            "model": "any",
            "connected_devices": {},
            "current_time": "2025-06-01T08:00:00",
        }))
        .await
    }

    /// GET `uri`. Returns (HTTP status code, response JSON body).
    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = self
            .router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, json)
    }
}

/// Wrap scenario text the way the generator usually answers.
pub fn fenced(body: &str) -> String {
    format!("Here is the JOI code:\n```joi\n{body}\n```\n")
}
