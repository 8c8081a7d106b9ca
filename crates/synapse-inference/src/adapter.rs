//! Provider adapter: uniform enrichment operations over a primary backend
//! and an optional fallback.
//!
//! Fallback is decided per call. Only summarization and embedding retry on
//! the fallback, and only when the primary failed with a transient kind
//! (`QuotaExceeded` or `Unavailable`).

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use synapse_core::defaults::{
    CATEGORY_INPUT_CHARS, CATEGORY_MAX_TOKENS, EMBED_INPUT_CHARS, SUMMARY_INPUT_CHARS,
    SUMMARY_MAX_TOKENS, TAGS_INPUT_CHARS, TAGS_MAX_TOKENS,
};
use synapse_core::text::truncate_chars;
use synapse_core::{
    Category, ContentType, InferenceBackend, ProviderError, ProviderKind, ProviderResult,
    SynapseConfig,
};

use crate::gemini::{GeminiBackend, GeminiConfig};
use crate::openai::{OpenAIBackend, OpenAIConfig};
use crate::prompts;

/// Which backend serves calls, and which one takes over on transient failure.
#[derive(Clone)]
pub struct ProviderStrategy {
    primary: Arc<dyn InferenceBackend>,
    fallback: Option<Arc<dyn InferenceBackend>>,
}

impl ProviderStrategy {
    pub fn new(primary: Arc<dyn InferenceBackend>) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn InferenceBackend>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Build the strategy named by `AI_PROVIDER` / `AI_FALLBACK_PROVIDER`.
    pub fn from_config(config: &SynapseConfig) -> ProviderResult<Self> {
        let primary = build_backend(config, config.primary_provider)?;
        let strategy = Self::new(primary);
        match config.fallback_provider {
            Some(kind) => Ok(strategy.with_fallback(build_backend(config, kind)?)),
            None => Ok(strategy),
        }
    }

    pub fn primary(&self) -> &Arc<dyn InferenceBackend> {
        &self.primary
    }

    pub fn fallback(&self) -> Option<&Arc<dyn InferenceBackend>> {
        self.fallback.as_ref()
    }

    /// The fallback backend, if `err` permits retrying on it.
    fn fallback_for(&self, err: &ProviderError) -> Option<&Arc<dyn InferenceBackend>> {
        if err.is_transient() {
            self.fallback.as_ref()
        } else {
            None
        }
    }
}

/// Construct a concrete backend for `kind` from configuration.
pub fn build_backend(
    config: &SynapseConfig,
    kind: ProviderKind,
) -> ProviderResult<Arc<dyn InferenceBackend>> {
    let settings = config.provider(kind);
    let backend: Arc<dyn InferenceBackend> = match kind {
        ProviderKind::Gemini => Arc::new(GeminiBackend::new(GeminiConfig::from(settings))?),
        ProviderKind::OpenAI => Arc::new(OpenAIBackend::new(OpenAIConfig::from(settings))?),
    };
    Ok(backend)
}

/// Enrichment operations used by ingestion and search.
#[derive(Clone)]
pub struct ProviderAdapter {
    strategy: ProviderStrategy,
}

impl ProviderAdapter {
    pub fn new(strategy: ProviderStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &ProviderStrategy {
        &self.strategy
    }

    /// Embed `text` (truncated to the embedding budget).
    #[instrument(skip(self, text), fields(subsystem = "inference", component = "adapter", op = "embed"))]
    pub async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        let input = truncate_chars(text, EMBED_INPUT_CHARS);
        match self.strategy.primary.embed(input).await {
            Ok(vector) => Ok(vector),
            Err(err) => match self.strategy.fallback_for(&err) {
                Some(fallback) => {
                    log_fallback("embed", &err, fallback.as_ref());
                    fallback.embed(input).await
                }
                None => Err(err),
            },
        }
    }

    /// Summarize `content` in a few sentences.
    #[instrument(skip(self, content), fields(subsystem = "inference", component = "adapter", op = "summarize"))]
    pub async fn summarize(&self, content: &str) -> ProviderResult<String> {
        let prompt = prompts::summary_prompt(truncate_chars(content, SUMMARY_INPUT_CHARS));
        match self.strategy.primary.generate(&prompt, SUMMARY_MAX_TOKENS).await {
            Ok(summary) => Ok(summary),
            Err(err) => match self.strategy.fallback_for(&err) {
                Some(fallback) => {
                    log_fallback("summarize", &err, fallback.as_ref());
                    fallback.generate(&prompt, SUMMARY_MAX_TOKENS).await
                }
                None => Err(err),
            },
        }
    }

    /// Generate tags for `content`. Uses the primary backend only.
    #[instrument(skip(self, content), fields(subsystem = "inference", component = "adapter", op = "generate_tags"))]
    pub async fn generate_tags(&self, content: &str) -> ProviderResult<Vec<String>> {
        let prompt = prompts::tags_prompt(truncate_chars(content, TAGS_INPUT_CHARS));
        let response = self.strategy.primary.generate(&prompt, TAGS_MAX_TOKENS).await?;
        let tags = prompts::parse_tags(&response);
        debug!(tag_count = tags.len(), "Parsed tags");
        Ok(tags)
    }

    /// Pick a category for the item. Uses the primary backend only.
    #[instrument(skip(self, title, content), fields(subsystem = "inference", component = "adapter", op = "categorize"))]
    pub async fn categorize(
        &self,
        title: &str,
        content: &str,
        content_type: Option<ContentType>,
    ) -> ProviderResult<Category> {
        let type_label = content_type.map(|t| t.as_str()).unwrap_or("unspecified");
        let prompt = prompts::category_prompt(
            title,
            type_label,
            truncate_chars(content, CATEGORY_INPUT_CHARS),
        );
        let response = self
            .strategy
            .primary
            .generate(&prompt, CATEGORY_MAX_TOKENS)
            .await?;
        let category = prompts::parse_category(&response);
        debug!(category = %category, "Parsed category");
        Ok(category)
    }
}

fn log_fallback(op: &str, err: &ProviderError, fallback: &dyn InferenceBackend) {
    warn!(
        subsystem = "inference",
        component = "adapter",
        op,
        provider = %err.provider,
        error_kind = %err.kind,
        fallback = fallback.name(),
        "Primary provider failed, retrying on fallback"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockInferenceBackend;
    use synapse_core::ProviderErrorKind;

    fn adapter(primary: MockInferenceBackend, fallback: Option<MockInferenceBackend>) -> ProviderAdapter {
        let strategy = ProviderStrategy::new(Arc::new(primary));
        let strategy = match fallback {
            Some(fb) => strategy.with_fallback(Arc::new(fb)),
            None => strategy,
        };
        ProviderAdapter::new(strategy)
    }

    #[tokio::test]
    async fn test_embed_falls_back_on_quota() {
        let primary = MockInferenceBackend::new()
            .with_name("primary")
            .with_embed_error(ProviderErrorKind::QuotaExceeded);
        let fallback = MockInferenceBackend::new().with_name("fallback").with_dimension(8);

        let adapter = adapter(primary.clone(), Some(fallback.clone()));
        let vector = adapter.embed("hello").await.unwrap();

        assert_eq!(vector.len(), 8);
        assert_eq!(primary.embed_call_count(), 1);
        assert_eq!(fallback.embed_call_count(), 1);
    }

    #[tokio::test]
    async fn test_summarize_falls_back_on_unavailable() {
        let primary = MockInferenceBackend::new()
            .with_generate_error(ProviderErrorKind::Unavailable);
        let fallback = MockInferenceBackend::new().with_fixed_response("Fallback summary.");

        let adapter = adapter(primary, Some(fallback));
        assert_eq!(adapter.summarize("text").await.unwrap(), "Fallback summary.");
    }

    #[tokio::test]
    async fn test_auth_error_does_not_fall_back() {
        let primary = MockInferenceBackend::new()
            .with_name("primary")
            .with_embed_error(ProviderErrorKind::AuthError);
        let fallback = MockInferenceBackend::new();

        let adapter = adapter(primary, Some(fallback.clone()));
        let err = adapter.embed("hello").await.unwrap_err();

        assert_eq!(err.kind, ProviderErrorKind::AuthError);
        assert_eq!(err.provider, "primary");
        assert_eq!(fallback.embed_call_count(), 0);
    }

    #[tokio::test]
    async fn test_tags_never_use_fallback() {
        let primary = MockInferenceBackend::new()
            .with_generate_error(ProviderErrorKind::QuotaExceeded);
        let fallback = MockInferenceBackend::new().with_fixed_response("a, b");

        let adapter = adapter(primary, Some(fallback.clone()));
        let err = adapter.generate_tags("text").await.unwrap_err();

        assert_eq!(err.kind, ProviderErrorKind::QuotaExceeded);
        assert_eq!(fallback.generate_call_count(), 0);
    }

    #[tokio::test]
    async fn test_fallback_is_not_sticky() {
        let primary = MockInferenceBackend::new()
            .with_generate_error_on("Summarize", ProviderErrorKind::Unavailable)
            .with_fixed_response("Technology");
        let fallback = MockInferenceBackend::new().with_fixed_response("From fallback");

        let adapter = adapter(primary.clone(), Some(fallback.clone()));
        adapter.summarize("text").await.unwrap();
        let category = adapter.categorize("Title", "text", None).await.unwrap();

        assert_eq!(category, Category::Technology);
        assert_eq!(primary.generate_call_count(), 2);
        assert_eq!(fallback.generate_call_count(), 1);
    }

    #[tokio::test]
    async fn test_inputs_truncated_and_budgets_passed() {
        let primary = MockInferenceBackend::new().with_fixed_response("rust, Rust, tokio");
        let adapter = adapter(primary.clone(), None);
        let long = "é".repeat(10_000);

        adapter.embed(&long).await.unwrap();
        let tags = adapter.generate_tags(&long).await.unwrap();
        adapter.summarize(&long).await.unwrap();
        adapter.categorize("t", &long, Some(ContentType::Note)).await.unwrap();

        assert_eq!(tags, vec!["rust", "tokio"]);

        let calls = primary.get_calls();
        assert_eq!(calls[0].input.chars().count(), EMBED_INPUT_CHARS);
        assert_eq!(calls[1].max_tokens, Some(TAGS_MAX_TOKENS));
        assert!(calls[1].input.chars().filter(|c| *c == 'é').count() == TAGS_INPUT_CHARS);
        assert_eq!(calls[2].max_tokens, Some(SUMMARY_MAX_TOKENS));
        assert!(calls[2].input.chars().filter(|c| *c == 'é').count() == SUMMARY_INPUT_CHARS);
        assert_eq!(calls[3].max_tokens, Some(CATEGORY_MAX_TOKENS));
        assert!(calls[3].input.contains("Type: note"));
    }

    #[test]
    fn test_strategy_from_config() {
        let config = SynapseConfig {
            primary_provider: ProviderKind::OpenAI,
            fallback_provider: Some(ProviderKind::Gemini),
            ..Default::default()
        };
        let strategy = ProviderStrategy::from_config(&config).unwrap();
        assert_eq!(strategy.primary().name(), "openai");
        assert_eq!(strategy.fallback().map(|b| b.name()), Some("gemini"));
    }
}
