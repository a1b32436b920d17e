//! DeepL machine translation client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::Translator;
use crate::error::ServiceError;

/// Configuration for the `[translator]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// DeepL translate endpoint.
    #[serde(default = "default_url")]
    pub url: String,
    /// DeepL auth key (`DEEPL_API_KEY` env var). Translation is skipped
    /// without one.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_source_lang")]
    pub source_lang: String,
    #[serde(default = "default_target_lang")]
    pub target_lang: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_enabled() -> bool {
    true
}
fn default_url() -> String {
    "https://api-free.deepl.com/v2/translate".into()
}
fn default_source_lang() -> String {
    "KO".into()
}
fn default_target_lang() -> String {
    "EN".into()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            url: default_url(),
            api_key: None,
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct Translation {
    text: String,
}

/// Client for the DeepL v2 translate API.
pub struct DeepLTranslator {
    client: reqwest::Client,
    config: TranslatorConfig,
}

impl DeepLTranslator {
    pub fn new(config: TranslatorConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Translator for DeepLTranslator {
    async fn translate(&self, text: &str) -> Result<String, ServiceError> {
        let auth_key = self.config.api_key.as_deref().unwrap_or_default();
        let form = [
            ("auth_key", auth_key),
            ("text", text),
            ("source_lang", self.config.source_lang.as_str()),
            ("target_lang", self.config.target_lang.as_str()),
        ];

        let response = self.client.post(&self.config.url).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TranslateResponse = response.json().await?;
        parsed
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ServiceError::Empty)
    }

    fn name(&self) -> &str {
        "deepl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn translator_for(server: &MockServer) -> DeepLTranslator {
        DeepLTranslator::new(TranslatorConfig {
            url: format!("{}/v2/translate", server.uri()),
            api_key: Some("test-key".into()),
            timeout_secs: 2,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn translates_first_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/translate"))
            .and(body_string_contains("auth_key=test-key"))
            .and(body_string_contains("source_lang=KO"))
            .and(body_string_contains("target_lang=EN"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "translations": [
                    {"detected_source_language": "KO", "text": "Turn on the living room light"}
                ]
            })))
            .mount(&server)
            .await;

        let result = translator_for(&server).translate("거실 불 켜줘").await.unwrap();
        assert_eq!(result, "Turn on the living room light");
    }

    #[tokio::test]
    async fn non_200_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/translate"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
            .mount(&server)
            .await;

        let err = translator_for(&server).translate("hello").await.unwrap_err();
        assert!(matches!(err, ServiceError::Status { status: 403, .. }));
    }

    #[tokio::test]
    async fn empty_translation_list() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/translate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"translations": []})),
            )
            .mount(&server)
            .await;

        let err = translator_for(&server).translate("hello").await.unwrap_err();
        assert!(matches!(err, ServiceError::Empty));
    }

    #[tokio::test]
    async fn garbage_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/translate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = translator_for(&server).translate("hello").await.unwrap_err();
        assert!(matches!(err, ServiceError::Decode(_)));
    }
}
