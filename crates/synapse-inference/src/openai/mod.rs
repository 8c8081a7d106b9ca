//! OpenAI-compatible inference backend.
//!
//! Talks to `/chat/completions` for generation and `/embeddings` for
//! embeddings. Any endpoint speaking the same protocol works by pointing
//! `base_url` at it.
//!
//! # Example
//!
//! ```rust,no_run
//! use synapse_inference::openai::{OpenAIBackend, OpenAIConfig};
//! use synapse_core::EmbeddingBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = OpenAIConfig {
//!         api_key: Some("sk-...".to_string()),
//!         ..Default::default()
//!     };
//!     let backend = OpenAIBackend::new(config).unwrap();
//!     let vector = backend.embed("Hello, world!").await.unwrap();
//! }
//! ```

mod backend;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use types::*;
