//! Gemini inference backend.
//!
//! Uses `models/{model}:generateContent` for generation and
//! `models/{model}:embedContent` for embeddings, authenticating with the
//! `key` query parameter.

mod backend;
mod types;

pub use backend::{GeminiBackend, GeminiConfig};
pub use types::*;
