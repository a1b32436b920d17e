//! API server configuration, loadable from TOML with environment overrides.

use std::path::Path;

use jg_retrieval::RetrievalConfig;
use jg_scenario::{GrammarVariant, ValidatorConfig};
use serde::Deserialize;

use crate::services::{EmbedderConfig, GeneratorConfig, TranslatorConfig};

/// Top-level API server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub resources: ResourceConfig,
    #[serde(default)]
    pub translator: TranslatorConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub embedder: EmbedderConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub validator: ValidatorConfig,
    /// Scenario header layout the generator was trained on.
    #[serde(default)]
    pub grammar_variant: GrammarVariant,
}

/// Listen address.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Files loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    /// Service-document file describing every device class.
    #[serde(default = "default_vocabulary")]
    pub vocabulary: String,
    /// JOI Lang grammar rules placed at the top of the system prompt.
    #[serde(default = "default_grammar")]
    pub grammar: String,
    /// Precomputed embedding index. Built at startup when absent.
    #[serde(default)]
    pub embedding_index: Option<String>,
    /// Connected devices remembered for the default site at startup.
    #[serde(default = "default_site")]
    pub default_site: Option<String>,
}

fn default_vocabulary() -> String {
    "resources/service_list.txt".into()
}

fn default_grammar() -> String {
    "resources/grammar.txt".into()
}

fn default_site() -> Option<String> {
    Some("resources/default_site.json".into())
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            vocabulary: default_vocabulary(),
            grammar: default_grammar(),
            embedding_index: None,
            default_site: default_site(),
        }
    }
}

impl ApiConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// File config (or defaults when `path` is `None`) with environment
    /// overrides applied.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `DEEPL_API_KEY`, `LLM_API_KEY`, `JOI_HOST` and `JOI_PORT`.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var("DEEPL_API_KEY").filter(|v| !v.is_empty()) {
            self.translator.api_key = Some(key);
        }
        if let Some(key) = var("LLM_API_KEY").filter(|v| !v.is_empty()) {
            self.generator.api_key = Some(key);
        }
        if let Some(host) = var("JOI_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("JOI_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "ignoring invalid JOI_PORT"),
            }
        }
    }
}
