//! # synapse-inference
//!
//! Language-model access for synapse.
//!
//! This crate provides:
//! - [`ProviderAdapter`]: embed, summarize, tag and categorize over a
//!   primary backend with per-call fallback
//! - Gemini backend (`generateContent` / `embedContent`)
//! - OpenAI-compatible backend (`/chat/completions` / `/embeddings`)
//! - Mock backend for tests (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use synapse_core::SynapseConfig;
//! use synapse_inference::{ProviderAdapter, ProviderStrategy};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = SynapseConfig::from_env().unwrap();
//!     let adapter = ProviderAdapter::new(ProviderStrategy::from_config(&config).unwrap());
//!     let summary = adapter.summarize("Long article text...").await;
//! }
//! ```

pub mod adapter;
pub mod gemini;
mod http;
pub mod openai;
pub mod prompts;

// Mock inference backend for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use adapter::{build_backend, ProviderAdapter, ProviderStrategy};
pub use gemini::{GeminiBackend, GeminiConfig};
pub use openai::{OpenAIBackend, OpenAIConfig};
