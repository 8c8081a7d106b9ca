//! Gemini inference backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument};

use synapse_core::defaults::{
    GEMINI_EMBED_MODEL, GEMINI_GEN_MODEL, GEMINI_URL, GEN_TEMPERATURE, PROVIDER_TIMEOUT_SECS,
};
use synapse_core::{
    EmbeddingBackend, GenerationBackend, InferenceBackend, ProviderError, ProviderErrorKind,
    ProviderResult, ProviderSettings,
};

use super::types::*;
use crate::http::{build_client, read_json};

const PROVIDER: &str = "gemini";

/// Configuration for the Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Base URL, up to and including the API version segment.
    pub base_url: String,
    /// API key, sent as the `key` query parameter.
    pub api_key: Option<String>,
    pub embed_model: String,
    pub gen_model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: GEMINI_URL.to_string(),
            api_key: None,
            embed_model: GEMINI_EMBED_MODEL.to_string(),
            gen_model: GEMINI_GEN_MODEL.to_string(),
            timeout_seconds: PROVIDER_TIMEOUT_SECS,
        }
    }
}

impl From<&ProviderSettings> for GeminiConfig {
    fn from(settings: &ProviderSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            embed_model: settings.embed_model.clone(),
            gen_model: settings.gen_model.clone(),
            timeout_seconds: settings.timeout_secs,
        }
    }
}

/// Gemini inference backend.
pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> ProviderResult<Self> {
        let client = build_client(PROVIDER, config.timeout_seconds)?;

        info!(
            "Initializing Gemini backend: url={}, embed={}, gen={}",
            config.base_url, config.embed_model, config.gen_model
        );

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Build a POST for `models/{model}:{method}` with the key attached.
    fn build_request(&self, model: &str, method: &str) -> ProviderResult<reqwest::RequestBuilder> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            ProviderError::new(PROVIDER, ProviderErrorKind::AuthError, "GEMINI_API_KEY not set")
        })?;

        let url = format!(
            "{}/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            model,
            method
        );

        Ok(self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .header("Content-Type", "application/json"))
    }
}

#[async_trait]
impl EmbeddingBackend for GeminiBackend {
    #[instrument(skip(self, text), fields(subsystem = "inference", component = "gemini", op = "embed", model = %self.config.embed_model, text_len = text.len()))]
    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        let request = EmbedContentRequest {
            model: format!("models/{}", self.config.embed_model),
            content: Content::text(text),
        };

        let response = self
            .build_request(&self.config.embed_model, "embedContent")?
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(PROVIDER, &e))?;

        let result: EmbedContentResponse = read_json(PROVIDER, response).await?;

        if result.embedding.values.is_empty() {
            return Err(ProviderError::malformed(PROVIDER, "No embedding data returned"));
        }

        debug!(dimension = result.embedding.values.len(), "Embedding complete");
        Ok(result.embedding.values)
    }

    fn embed_model(&self) -> &str {
        &self.config.embed_model
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    #[instrument(skip(self, prompt), fields(subsystem = "inference", component = "gemini", op = "generate", model = %self.config.gen_model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str, max_tokens: u32) -> ProviderResult<String> {
        let request = GenerateContentRequest {
            contents: vec![Content::text(prompt)],
            generation_config: GenerationConfig {
                max_output_tokens: max_tokens,
                temperature: GEN_TEMPERATURE,
            },
        };

        let response = self
            .build_request(&self.config.gen_model, "generateContent")?
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(PROVIDER, &e))?;

        let result: GenerateContentResponse = read_json(PROVIDER, response).await?;

        let content = result
            .first_text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::malformed(PROVIDER, "No response from Gemini"))?;

        debug!("Generation complete, response length: {}", content.len());
        Ok(content)
    }

    fn gen_model(&self) -> &str {
        &self.config.gen_model
    }
}

impl InferenceBackend for GeminiBackend {
    fn name(&self) -> &str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeminiConfig::default();
        assert_eq!(config.gen_model, "gemini-1.5-flash");
        assert_eq!(config.embed_model, "text-embedding-004");
        assert!(config.api_key.is_none());
    }

    #[tokio::test]
    async fn test_missing_key_is_auth_error() {
        let backend = GeminiBackend::new(GeminiConfig::default()).unwrap();
        let err = backend.generate("hello", 10).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::AuthError);
        assert_eq!(err.provider, "gemini");
    }
}
