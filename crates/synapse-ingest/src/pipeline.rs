//! Ingestion orchestrator.
//!
//! `create_item` fans out four independent enrichment tasks (summary, tags,
//! embedding, and category followed by metadata) and joins them before a
//! single relational insert. No task cancels another; each failure degrades
//! only its own slot, except a failed embedding which aborts the ingestion.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::json;
use tracing::field::{display, Empty};
use tracing::{debug, info, instrument, warn, Span};
use uuid::Uuid;

use synapse_core::logging;
use synapse_core::text::summary_fallback;
use synapse_core::{
    CapturedInput, Category, ContentType, Error, Item, ItemRepository, Result, SynapseConfig,
    VectorStore,
};
use synapse_inference::ProviderAdapter;

use crate::metadata::{MetadataRequest, MetadataResolver, ResolvedMetadata};

/// Tunables for the ingestion pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestSettings {
    /// Vector-store collection receiving item embeddings.
    pub vector_collection: String,
    /// Timeout scope for one `create_item` call.
    pub timeout: Duration,
    /// Characters of content kept when summarization fails.
    pub summary_fallback_chars: usize,
}

impl From<&SynapseConfig> for IngestSettings {
    fn from(config: &SynapseConfig) -> Self {
        Self {
            vector_collection: config.vector_collection.clone(),
            timeout: config.ingest_timeout(),
            summary_fallback_chars: config.summary_fallback_chars,
        }
    }
}

/// Turns captured input into persisted, enriched items.
#[derive(Clone)]
pub struct IngestionPipeline {
    adapter: ProviderAdapter,
    resolver: MetadataResolver,
    items: Arc<dyn ItemRepository>,
    vectors: Arc<dyn VectorStore>,
    settings: IngestSettings,
}

impl IngestionPipeline {
    pub fn new(
        adapter: ProviderAdapter,
        resolver: MetadataResolver,
        items: Arc<dyn ItemRepository>,
        vectors: Arc<dyn VectorStore>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            adapter,
            resolver,
            items,
            vectors,
            settings,
        }
    }

    /// Enrich and persist one captured input.
    ///
    /// Fails with `InvalidInput` when title and content are both blank,
    /// `EmbeddingUnavailable` when no embedding could be produced (nothing is
    /// written), and `Timeout` when the whole call outlives its scope.
    #[instrument(skip(self, input), fields(subsystem = "ingest", component = "pipeline", op = "create_item", item_id = Empty))]
    pub async fn create_item(&self, input: CapturedInput) -> Result<Item> {
        if input.title.trim().is_empty() && input.content.trim().is_empty() {
            return Err(Error::InvalidInput(
                "title and content are both empty".to_string(),
            ));
        }

        let start = Instant::now();
        let timeout = self.settings.timeout;
        match tokio::time::timeout(timeout, self.enrich_and_store(&input)).await {
            Ok(result) => {
                if let Ok(item) = &result {
                    info!(
                        item_id = %item.id,
                        content_type = %item.content_type,
                        category = %item.category,
                        tag_count = item.tags.len(),
                        embedded = item.embedding_id.is_some(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Item created"
                    );
                }
                result
            }
            Err(_) => {
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "Ingestion timed out, abandoning outstanding calls"
                );
                Err(Error::Timeout(timeout.as_millis() as u64))
            }
        }
    }

    async fn enrich_and_store(&self, input: &CapturedInput) -> Result<Item> {
        let id = Uuid::now_v7();
        Span::current().record(logging::ITEM_ID, display(id));
        let title = input.title.trim();
        let content = input.effective_content();

        let (summary, tags, embedding, (category, metadata)) = tokio::join!(
            self.adapter.summarize(content),
            self.adapter.generate_tags(content),
            self.adapter.embed(content),
            self.categorize_and_resolve(input),
        );

        let embedding = embedding.map_err(|e| {
            warn!(
                item_id = %id,
                provider = %e.provider,
                error_kind = %e.kind,
                "Embedding failed, rejecting item"
            );
            Error::EmbeddingUnavailable(e)
        })?;

        let summary = match summary {
            Ok(summary) if !summary.trim().is_empty() => summary.trim().to_string(),
            Ok(_) => {
                warn!(item_id = %id, "Empty summary, using content prefix");
                summary_fallback(content, self.settings.summary_fallback_chars)
            }
            Err(e) => {
                warn!(item_id = %id, error = %e, "Summarization failed, using content prefix");
                summary_fallback(content, self.settings.summary_fallback_chars)
            }
        };

        let tags = tags.unwrap_or_else(|e| {
            warn!(item_id = %id, error = %e, "Tag generation failed, continuing without tags");
            Vec::new()
        });

        let content_type = resolve_content_type(input, &metadata);

        let embedding_id = id.to_string();
        let attributes = json!({ "title": title, "type": content_type.as_str() });
        let embedding_id = match self
            .vectors
            .add_embedding(
                &self.settings.vector_collection,
                &embedding_id,
                &embedding,
                attributes,
            )
            .await
        {
            Ok(()) => Some(embedding_id),
            Err(e) => {
                warn!(item_id = %id, error = %e, "Vector write failed, item will be text-search only");
                None
            }
        };

        let item = Item {
            id,
            title: title.to_string(),
            content: content.to_string(),
            summary,
            category,
            tags,
            source_url: input.source_url().map(str::to_string),
            content_type,
            embedding_id,
            image_url: metadata.image_url,
            embed_html: metadata.embed_html,
            created_at: Utc::now(),
        };

        self.items.insert(&item).await?;
        Ok(item)
    }

    /// Metadata branch: categorize, then resolve images with that category.
    async fn categorize_and_resolve(&self, input: &CapturedInput) -> (Category, ResolvedMetadata) {
        let category = self
            .adapter
            .categorize(input.title.trim(), input.effective_content(), input.type_hint)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Categorization failed, using Other");
                Category::Other
            });

        let metadata = self
            .resolver
            .resolve(&MetadataRequest::from_input(input, category))
            .await;
        debug!(
            category = %category,
            has_image = metadata.image_url.is_some(),
            inferred_type = ?metadata.inferred_type,
            "Metadata branch complete"
        );
        (category, metadata)
    }

    pub async fn get_item(&self, id: Uuid) -> Result<Item> {
        self.items.get(id).await
    }

    /// All items, newest first.
    pub async fn list_items(&self) -> Result<Vec<Item>> {
        self.items.list().await
    }

    /// Delete the item, then its embedding. The vector delete is best-effort.
    #[instrument(skip(self), fields(subsystem = "ingest", component = "pipeline", op = "delete_item"))]
    pub async fn delete_item(&self, id: Uuid) -> Result<()> {
        self.items.delete(id).await?;

        if let Err(e) = self
            .vectors
            .delete(&self.settings.vector_collection, &id.to_string())
            .await
        {
            warn!(item_id = %id, error = %e, "Vector delete failed, embedding left behind");
        }
        info!(item_id = %id, "Item deleted");
        Ok(())
    }
}

/// Caller hint, else inferred type, else `url` with a source URL, else `note`.
fn resolve_content_type(input: &CapturedInput, metadata: &ResolvedMetadata) -> ContentType {
    input
        .type_hint
        .or(metadata.inferred_type)
        .unwrap_or(if input.source_url().is_some() {
            ContentType::Url
        } else {
            ContentType::Note
        })
}
