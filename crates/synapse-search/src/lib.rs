//! # synapse-search
//!
//! Hybrid search for synapse.
//!
//! This crate provides:
//! - Query interpretation: tags, type, author, price and date hints pulled
//!   out of free text ([`parse_query`])
//! - Score fusion of semantic and text results ([`fuse`])
//! - Price post-filtering ([`apply_post_filters`])
//! - [`HybridSearchEngine`]: concurrent retrieval with single-path degradation
//!
//! ## Example
//!
//! ```rust,ignore
//! use synapse_search::{HybridSearchEngine, SearchSettings};
//!
//! let engine = HybridSearchEngine::new(
//!     adapter,
//!     Arc::new(db.items.clone()),
//!     Arc::new(db.vectors.clone()),
//!     SearchSettings::from(&config),
//! );
//! let results = engine.search("pasta recipe tag:dinner", 20).await?;
//! ```

pub mod filters;
pub mod fusion;
pub mod hybrid;
pub mod query;

pub use filters::{apply_post_filters, extract_price, within_price_bounds};
pub use fusion::{boosted_score, fuse, similarity_from_distance};
pub use hybrid::{HybridSearchEngine, SearchSettings};
pub use query::{parse_query, parse_query_at};
