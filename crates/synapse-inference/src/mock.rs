//! Mock inference backend for deterministic testing.
//!
//! Generates deterministic embeddings and scripted responses, records every
//! call, and can be told to fail with a specific [`ProviderErrorKind`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use synapse_inference::mock::MockInferenceBackend;
//!
//! let backend = MockInferenceBackend::new()
//!     .with_dimension(64)
//!     .with_response_mapping("Extract 3-5 relevant tags", "rust, async")
//!     .with_fixed_response("Default summary");
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use synapse_core::{
    EmbeddingBackend, GenerationBackend, InferenceBackend, ProviderError, ProviderErrorKind,
    ProviderResult,
};

/// Mock inference backend for testing.
#[derive(Clone)]
pub struct MockInferenceBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    name: String,
    dimension: usize,
    /// (needle, response) pairs; the first needle contained in the prompt wins.
    response_mappings: Vec<(String, String)>,
    default_response: String,
    latency_ms: u64,
    failure_rate: f64,
    embed_error: Option<ProviderErrorKind>,
    generate_error: Option<ProviderErrorKind>,
    /// Generation fails with this kind when the prompt contains the needle.
    generate_errors_on: Vec<(String, ProviderErrorKind)>,
}

#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
    pub max_tokens: Option<u32>,
    pub timestamp: std::time::Instant,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            dimension: 384,
            response_mappings: Vec::new(),
            default_response: "Mock response".to_string(),
            latency_ms: 0,
            failure_rate: 0.0,
            embed_error: None,
            generate_error: None,
            generate_errors_on: Vec::new(),
        }
    }
}

impl MockInferenceBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the backend name reported in errors and logs.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).name = name.into();
        self
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        Arc::make_mut(&mut self.config).dimension = dimension;
        self
    }

    /// Set the response returned when no mapping matches.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Respond with `output` to any prompt containing `needle`.
    pub fn with_response_mapping(
        mut self,
        needle: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .response_mappings
            .push((needle.into(), output.into()));
        self
    }

    /// Set simulated latency for all operations.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Set failure rate (0.0 - 1.0); random failures are `Unavailable`.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        Arc::make_mut(&mut self.config).failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Make every embed call fail with `kind`.
    pub fn with_embed_error(mut self, kind: ProviderErrorKind) -> Self {
        Arc::make_mut(&mut self.config).embed_error = Some(kind);
        self
    }

    /// Make every generate call fail with `kind`.
    pub fn with_generate_error(mut self, kind: ProviderErrorKind) -> Self {
        Arc::make_mut(&mut self.config).generate_error = Some(kind);
        self
    }

    /// Make generate calls whose prompt contains `needle` fail with `kind`.
    pub fn with_generate_error_on(mut self, needle: impl Into<String>, kind: ProviderErrorKind) -> Self {
        Arc::make_mut(&mut self.config)
            .generate_errors_on
            .push((needle.into(), kind));
        self
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls().clone()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.calls().clear()
    }

    /// Get number of embed calls.
    pub fn embed_call_count(&self) -> usize {
        self.count("embed")
    }

    /// Get number of generation calls.
    pub fn generate_call_count(&self) -> usize {
        self.count("generate")
    }

    fn calls(&self) -> MutexGuard<'_, Vec<MockCall>> {
        self.call_log.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn count(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    fn log_call(&self, operation: &str, input: &str, max_tokens: Option<u32>) {
        self.calls().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
            max_tokens,
            timestamp: std::time::Instant::now(),
        });
    }

    fn error(&self, kind: ProviderErrorKind) -> ProviderError {
        ProviderError::new(self.config.name.clone(), kind, "Simulated failure for testing")
    }

    fn should_fail_randomly(&self) -> bool {
        use rand::Rng;
        self.config.failure_rate > 0.0 && rand::thread_rng().gen::<f64>() < self.config.failure_rate
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }
    }
}

impl Default for MockInferenceBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingBackend for MockInferenceBackend {
    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        self.log_call("embed", text, None);
        self.simulate_latency().await;

        if let Some(kind) = self.config.embed_error {
            return Err(self.error(kind));
        }
        if self.should_fail_randomly() {
            return Err(self.error(ProviderErrorKind::Unavailable));
        }

        Ok(MockEmbeddingGenerator::generate(text, self.config.dimension))
    }

    fn embed_model(&self) -> &str {
        "mock-embed"
    }
}

#[async_trait]
impl GenerationBackend for MockInferenceBackend {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> ProviderResult<String> {
        self.log_call("generate", prompt, Some(max_tokens));
        self.simulate_latency().await;

        if let Some(kind) = self.config.generate_error {
            return Err(self.error(kind));
        }
        if let Some((_, kind)) = self
            .config
            .generate_errors_on
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
        {
            return Err(self.error(*kind));
        }
        if self.should_fail_randomly() {
            return Err(self.error(ProviderErrorKind::Unavailable));
        }

        let response = self
            .config
            .response_mappings
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| self.config.default_response.clone());
        Ok(response)
    }

    fn gen_model(&self) -> &str {
        "mock-gen"
    }
}

impl InferenceBackend for MockInferenceBackend {
    fn name(&self) -> &str {
        &self.config.name
    }
}

/// Mock embedding generator with deterministic output.
pub struct MockEmbeddingGenerator;

impl MockEmbeddingGenerator {
    /// Generate a deterministic embedding from text.
    ///
    /// Uses character-based hashing for reproducibility. The same text
    /// will always produce the same embedding.
    pub fn generate(text: &str, dimension: usize) -> Vec<f32> {
        let mut vec = vec![0.0; dimension.max(1)];
        let len = vec.len();

        for (i, c) in text.chars().enumerate() {
            let idx = (c as usize + i) % len;
            vec[idx] += 0.1;
        }

        Self::normalize(&mut vec);
        vec
    }

    fn normalize(vec: &mut [f32]) {
        let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            vec.iter_mut().for_each(|x| *x /= magnitude);
        }
    }

    /// Calculate cosine similarity between two vectors.
    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if mag_a > 0.0 && mag_b > 0.0 {
            dot / (mag_a * mag_b)
        } else {
            0.0
        }
    }
}
