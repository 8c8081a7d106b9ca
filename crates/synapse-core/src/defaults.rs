//! Centralized default constants for synapse.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic numbers.

// =============================================================================
// PROVIDERS
// =============================================================================

/// Primary provider when `AI_PROVIDER` is unset.
pub const PRIMARY_PROVIDER: &str = "gemini";

/// Gemini REST endpoint.
pub const GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini generation model.
pub const GEMINI_GEN_MODEL: &str = "gemini-1.5-flash";

/// Gemini embedding model.
pub const GEMINI_EMBED_MODEL: &str = "text-embedding-004";

/// OpenAI-compatible endpoint.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// OpenAI generation model.
pub const OPENAI_GEN_MODEL: &str = "gpt-4o-mini";

/// OpenAI embedding model.
pub const OPENAI_EMBED_MODEL: &str = "text-embedding-3-small";

/// Per-request timeout for provider calls (seconds).
pub const PROVIDER_TIMEOUT_SECS: u64 = 60;

/// Sampling temperature used for all generation calls.
pub const GEN_TEMPERATURE: f32 = 0.7;

// =============================================================================
// INPUT BUDGETS (characters)
// =============================================================================

/// Maximum characters of content sent for summarization.
pub const SUMMARY_INPUT_CHARS: usize = 3000;

/// Maximum characters of content sent for tag generation.
pub const TAGS_INPUT_CHARS: usize = 2000;

/// Maximum characters of content sent for categorization.
pub const CATEGORY_INPUT_CHARS: usize = 1500;

/// Maximum characters of content sent for embedding.
pub const EMBED_INPUT_CHARS: usize = 8000;

// =============================================================================
// OUTPUT BUDGETS (tokens)
// =============================================================================

pub const SUMMARY_MAX_TOKENS: u32 = 150;
pub const TAGS_MAX_TOKENS: u32 = 50;
pub const CATEGORY_MAX_TOKENS: u32 = 20;

// =============================================================================
// INGESTION
// =============================================================================

/// Characters kept from content when summarization fails.
pub const SUMMARY_FALLBACK_CHARS: usize = 200;

/// Timeout for one `create_item` call (seconds).
pub const INGEST_TIMEOUT_SECS: u64 = 90;

/// Timeout for each independent metadata lookup (seconds).
pub const METADATA_LOOKUP_TIMEOUT_SECS: u64 = 8;

/// User agent sent when fetching pages for preview metadata.
pub const PAGE_USER_AGENT: &str = "Mozilla/5.0 (compatible; SynapseBot/1.0)";

/// Bytes of page markup read for preview-image tags. Meta tags sit in
/// `<head>`, so the rest of the page is not downloaded.
pub const PAGE_BODY_MAX_BYTES: usize = 512 * 1024;

/// Open Library covers endpoint.
pub const OPEN_LIBRARY_COVERS_URL: &str = "https://covers.openlibrary.org";

/// Open Library search endpoint.
pub const OPEN_LIBRARY_SEARCH_URL: &str = "https://openlibrary.org";

/// Generic image source used for recipe and category previews.
pub const IMAGE_SOURCE_URL: &str = "https://source.unsplash.com";

// =============================================================================
// SEARCH
// =============================================================================

/// Vector-store collection holding item embeddings.
pub const VECTOR_COLLECTION: &str = "synapse_items";

/// Default number of search results.
pub const SEARCH_LIMIT: usize = 20;

/// Upper bound on requested search results.
pub const SEARCH_LIMIT_MAX: usize = 100;

/// Each retrieval path fetches this many times `limit` candidates.
pub const CANDIDATE_MULTIPLIER: usize = 2;

/// Score for a text match with no semantic confirmation.
pub const TEXT_MATCH_BASE_SCORE: f32 = 0.5;

/// Weight kept from the semantic score when both paths agree.
pub const BOTH_PATHS_SEMANTIC_WEIGHT: f32 = 0.7;

/// Bonus added when both paths agree.
pub const BOTH_PATHS_BONUS: f32 = 0.3;

/// Timeout for one search call (seconds).
pub const SEARCH_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// SERVER
// =============================================================================

pub const DATABASE_URL: &str = "postgres://localhost/synapse";

/// Upper bound on pooled database connections.
pub const DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Seconds to wait for a free pooled connection.
pub const DATABASE_ACQUIRE_TIMEOUT_SECS: u64 = 30;
pub const HOST: &str = "0.0.0.0";
pub const PORT: u16 = 8080;
