//! OpenAI-compatible inference backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument};

use synapse_core::defaults::{
    GEN_TEMPERATURE, OPENAI_EMBED_MODEL, OPENAI_GEN_MODEL, OPENAI_URL, PROVIDER_TIMEOUT_SECS,
};
use synapse_core::{
    EmbeddingBackend, GenerationBackend, InferenceBackend, ProviderError, ProviderResult,
    ProviderSettings,
};

use super::types::*;
use crate::http::{build_client, read_json};

const PROVIDER: &str = "openai";

/// Configuration for OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Model to use for embeddings.
    pub embed_model: String,
    /// Model to use for generation.
    pub gen_model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: OPENAI_URL.to_string(),
            api_key: None,
            embed_model: OPENAI_EMBED_MODEL.to_string(),
            gen_model: OPENAI_GEN_MODEL.to_string(),
            timeout_seconds: PROVIDER_TIMEOUT_SECS,
        }
    }
}

impl From<&ProviderSettings> for OpenAIConfig {
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

/// OpenAI-compatible inference backend.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    /// Create a new OpenAI backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> ProviderResult<Self> {
        let client = build_client(PROVIDER, config.timeout_seconds)?;

        info!(
            "Initializing OpenAI backend: url={}, embed={}, gen={}",
            config.base_url, config.embed_model, config.gen_model
        );

        Ok(Self { client, config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Build a request with authentication if configured.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        req.header("Content-Type", "application/json")
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAIBackend {
    #[instrument(skip(self, text), fields(subsystem = "inference", component = "openai", op = "embed", model = %self.config.embed_model, text_len = text.len()))]
    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        let request = EmbeddingRequest {
            model: self.config.embed_model.clone(),
            input: text.to_string(),
            encoding_format: Some("float".to_string()),
        };

        let response = self
            .build_request("/embeddings")
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(PROVIDER, &e))?;

        let result: EmbeddingResponse = read_json(PROVIDER, response).await?;

        let vector = result
            .data
            .into_iter()
            .min_by_key(|d| d.index)
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ProviderError::malformed(PROVIDER, "No embedding data returned"))?;

        debug!(dimension = vector.len(), "Embedding complete");
        Ok(vector)
    }

    fn embed_model(&self) -> &str {
        &self.config.embed_model
    }
}

#[async_trait]
impl GenerationBackend for OpenAIBackend {
    #[instrument(skip(self, prompt), fields(subsystem = "inference", component = "openai", op = "generate", model = %self.config.gen_model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str, max_tokens: u32) -> ProviderResult<String> {
        let request = ChatCompletionRequest {
            model: self.config.gen_model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: Some(GEN_TEMPERATURE),
            max_tokens: Some(max_tokens),
        };

        let response = self
            .build_request("/chat/completions")
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(PROVIDER, &e))?;

        let result: ChatCompletionResponse = read_json(PROVIDER, response).await?;

        let content = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ProviderError::malformed(PROVIDER, "No response from OpenAI"))?;

        debug!("Generation complete, response length: {}", content.len());
        Ok(content)
    }

    fn gen_model(&self) -> &str {
        &self.config.gen_model
    }
}

impl InferenceBackend for OpenAIBackend {
    fn name(&self) -> &str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OpenAIConfig::default();
        assert_eq!(config.base_url, OPENAI_URL);
        assert_eq!(config.embed_model, "text-embedding-3-small");
        assert_eq!(config.gen_model, "gpt-4o-mini");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_config_from_settings() {
        let settings = ProviderSettings {
            api_key: Some("sk-test".to_string()),
            base_url: "http://localhost:8080/v1".to_string(),
            ..ProviderSettings::openai_defaults()
        };
        let config = OpenAIConfig::from(&settings);
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_model_name_accessors() {
        let config = OpenAIConfig {
            embed_model: "test-embed".to_string(),
            gen_model: "test-gen".to_string(),
            ..Default::default()
        };
        let backend = OpenAIBackend::new(config).unwrap();
        assert_eq!(backend.embed_model(), "test-embed");
        assert_eq!(backend.gen_model(), "test-gen");
        assert_eq!(backend.name(), "openai");
    }
}
