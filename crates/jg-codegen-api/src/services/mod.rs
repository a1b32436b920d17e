//! External collaborators: machine translation, text generation and
//! embedding.
//!
//! Each is a trait so the pipeline can be wired with HTTP clients in
//! production and with canned implementations in tests.

pub mod chat;
pub mod deepl;
pub mod embedder;

use std::sync::Arc;

use async_trait::async_trait;
use jg_retrieval::{Embedder, LexicalEmbedder};

use crate::config::ApiConfig;
use crate::error::ServiceError;
use crate::prompt::Prompt;

pub use chat::{ChatCompletionsGenerator, GeneratorConfig};
pub use deepl::{DeepLTranslator, TranslatorConfig};
pub use embedder::{EmbedderBackend, EmbedderConfig, HttpEmbedder};

/// Translates a request sentence into the language the generator expects.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, ServiceError>;

    /// Name of this backend (for logging).
    fn name(&self) -> &str;
}

/// Produces JOI code text from a prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> Result<String, ServiceError>;

    /// Name of this backend (for logging).
    fn name(&self) -> &str;
}

/// Returns its input unchanged. Used when translation is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTranslator;

#[async_trait]
impl Translator for PassthroughTranslator {
    async fn translate(&self, text: &str) -> Result<String, ServiceError> {
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "passthrough"
    }
}

/// Translator selected by config: DeepL when enabled and keyed, else
/// passthrough.
pub fn translator_from_config(config: &ApiConfig) -> Result<Arc<dyn Translator>, ServiceError> {
    match &config.translator.api_key {
        Some(key) if config.translator.enabled && !key.is_empty() => Ok(Arc::new(
            DeepLTranslator::new(config.translator.clone())?,
        )),
        _ => {
            tracing::info!("translation disabled, sentences are passed through");
            Ok(Arc::new(PassthroughTranslator))
        }
    }
}

pub fn generator_from_config(config: &ApiConfig) -> Result<Arc<dyn Generator>, ServiceError> {
    Ok(Arc::new(ChatCompletionsGenerator::new(config.generator.clone())?))
}

pub fn embedder_from_config(config: &ApiConfig) -> Result<Arc<dyn Embedder>, ServiceError> {
    let embedder: Arc<dyn Embedder> = match config.embedder.backend {
        EmbedderBackend::Http => Arc::new(HttpEmbedder::new(config.embedder.clone())?),
        EmbedderBackend::Lexical => Arc::new(LexicalEmbedder::new()),
    };
    Ok(embedder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passthrough_returns_input() {
        let t = PassthroughTranslator;
        assert_eq!(t.translate("거실 불 켜줘").await.unwrap(), "거실 불 켜줘");
        assert_eq!(t.name(), "passthrough");
    }

    #[test]
    fn translator_without_key_is_passthrough() {
        let config = ApiConfig::default();
        let translator = translator_from_config(&config).unwrap();
        assert_eq!(translator.name(), "passthrough");
    }

    #[test]
    fn translator_with_key_is_deepl() {
        let mut config = ApiConfig::default();
        config.translator.api_key = Some("secret".into());
        assert_eq!(translator_from_config(&config).unwrap().name(), "deepl");

        config.translator.enabled = false;
        assert_eq!(translator_from_config(&config).unwrap().name(), "passthrough");
    }

    #[test]
    fn default_embedder_is_lexical() {
        let embedder = embedder_from_config(&ApiConfig::default()).unwrap();
        assert_eq!(embedder.name(), "lexical");
    }
}
