//! Core traits for synapse abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::{ProviderError, Result};
use crate::models::*;

/// Result of a single language-model backend call.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate an embedding vector for the given text.
    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>>;

    /// Get the embedding model name being used.
    fn embed_model(&self) -> &str;
}

/// Backend for text generation (LLM).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt and an output token budget.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> ProviderResult<String>;

    /// Get the generation model name being used.
    fn gen_model(&self) -> &str;
}

/// Combined inference backend supporting both embedding and generation.
pub trait InferenceBackend: EmbeddingBackend + GenerationBackend {
    /// Backend name used in logs and errors ("gemini", "openai", "mock").
    fn name(&self) -> &str;
}

// =============================================================================
// STORE TRAITS
// =============================================================================

/// Relational store for items.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Insert a finalized item.
    async fn insert(&self, item: &Item) -> Result<()>;

    /// Fetch one item; `ItemNotFound` when absent.
    async fn get(&self, id: Uuid) -> Result<Item>;

    /// Fetch the items with the given ids. Missing ids are skipped.
    async fn get_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Item>>;

    /// All items, newest first.
    async fn list(&self) -> Result<Vec<Item>>;

    /// Delete an item; `ItemNotFound` when absent.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Filtered substring search, newest first.
    ///
    /// Residual terms match title, content or summary. The type filter only
    /// applies when there are no residual terms.
    async fn search_items(&self, filters: &QueryFilters, limit: usize) -> Result<Vec<Item>>;
}

/// A vector-store neighbor: stored id and non-negative distance (smaller is closer).
#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub id: String,
    pub distance: f32,
}

/// Nearest-neighbor index holding item embeddings.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store (or replace) an embedding under `id` in `collection`.
    async fn add_embedding(
        &self,
        collection: &str,
        id: &str,
        vector: &[f32],
        attributes: JsonValue,
    ) -> Result<()>;

    /// Return up to `k` neighbors of `vector`, closest first.
    async fn query(&self, collection: &str, vector: &[f32], k: usize) -> Result<Vec<VectorHit>>;

    /// Remove an embedding. Deleting a missing id is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;
}
