//! # synapse-ingest
//!
//! Ingestion for synapse: turns captured input into enriched, persisted items.
//!
//! This crate provides:
//! - [`IngestionPipeline`]: concurrent summary, tags, embedding and metadata
//!   enrichment with per-task degradation
//! - [`MetadataResolver`]: preview images, video embeds and type inference
//! - [`HttpPageFetcher`]: outbound HTTP for page and cover lookups
//!
//! ## Example
//!
//! ```rust,ignore
//! let fetcher = HttpPageFetcher::new(&config.metadata)?;
//! let resolver = MetadataResolver::new(Arc::new(fetcher), config.metadata.clone());
//! let pipeline = IngestionPipeline::new(
//!     adapter,
//!     resolver,
//!     Arc::new(db.items.clone()),
//!     Arc::new(db.vectors.clone()),
//!     IngestSettings::from(&config),
//! );
//! let item = pipeline.create_item(CapturedInput::new("Title", "Body")).await?;
//! ```

pub mod metadata;
pub mod page_fetch;
pub mod pipeline;

#[cfg(test)]
mod testing;

pub use metadata::{MetadataRequest, MetadataResolver, ResolvedMetadata};
pub use page_fetch::{HttpPageFetcher, PageFetcher};
pub use pipeline::{IngestSettings, IngestionPipeline};
