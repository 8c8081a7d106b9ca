//! Hybrid search engine combining vector similarity and relational matching.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::field::Empty;
use tracing::{debug, info, instrument, warn, Span};
use uuid::Uuid;

use synapse_core::defaults::{CANDIDATE_MULTIPLIER, SEARCH_LIMIT_MAX};
use synapse_core::logging;
use synapse_core::{
    Error, ItemRepository, QueryFilters, Result, SearchResult, SynapseConfig, VectorStore,
};
use synapse_inference::ProviderAdapter;

use crate::filters::apply_post_filters;
use crate::fusion::{fuse, similarity_from_distance};
use crate::query::parse_query;

/// Configuration for hybrid search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    /// Vector-store collection holding item embeddings.
    pub vector_collection: String,
    /// Each path fetches `limit * candidate_multiplier` candidates.
    pub candidate_multiplier: usize,
    /// Requested limits above this are clamped.
    pub max_limit: usize,
    /// Timeout scope for one search call.
    pub timeout: Duration,
}

impl From<&SynapseConfig> for SearchSettings {
    fn from(config: &SynapseConfig) -> Self {
        Self {
            vector_collection: config.vector_collection.clone(),
            candidate_multiplier: CANDIDATE_MULTIPLIER,
            max_limit: SEARCH_LIMIT_MAX,
            timeout: config.search_timeout(),
        }
    }
}

/// Hybrid search engine.
#[derive(Clone)]
pub struct HybridSearchEngine {
    adapter: ProviderAdapter,
    items: Arc<dyn ItemRepository>,
    vectors: Arc<dyn VectorStore>,
    settings: SearchSettings,
}

impl HybridSearchEngine {
    pub fn new(
        adapter: ProviderAdapter,
        items: Arc<dyn ItemRepository>,
        vectors: Arc<dyn VectorStore>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            adapter,
            items,
            vectors,
            settings,
        }
    }

    /// Search items for a free-text query.
    ///
    /// Semantic and text retrieval run concurrently. If one path fails the
    /// other's results are returned; only when both fail does the call fail,
    /// with `SearchUnavailable`.
    #[instrument(skip(self), fields(subsystem = "search", component = "hybrid_search", op = "search", result_count = Empty, degraded = Empty))]
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = limit.min(self.settings.max_limit);
        let timeout = self.settings.timeout;

        match tokio::time::timeout(timeout, self.search_inner(query, limit)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "Search timed out, abandoning outstanding calls"
                );
                Err(Error::Timeout(timeout.as_millis() as u64))
            }
        }
    }

    async fn search_inner(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let start = Instant::now();
        let filters = parse_query(query);
        let candidates = limit.saturating_mul(self.settings.candidate_multiplier);
        debug!(
            search_terms = %filters.search_terms,
            tag_count = filters.tags.len(),
            content_type = ?filters.content_type,
            has_dates = filters.date_from.is_some() || filters.date_to.is_some(),
            has_price = filters.has_price_bounds(),
            "Parsed query"
        );

        let (semantic, text) = tokio::join!(
            self.semantic_search(&filters, candidates),
            self.items.search_items(&filters, candidates),
        );

        let (semantic, text) = match (semantic, text) {
            (Ok(None), Err(text_err)) => {
                warn!(error = %text_err, "Text search failed with no semantic path to fall back on");
                return Err(Error::SearchUnavailable {
                    semantic: "skipped: no residual search terms".to_string(),
                    text: text_err.to_string(),
                });
            }
            (Err(semantic_err), Err(text_err)) => {
                warn!(
                    semantic_error = %semantic_err,
                    text_error = %text_err,
                    "Both retrieval paths failed"
                );
                return Err(Error::SearchUnavailable {
                    semantic: semantic_err.to_string(),
                    text: text_err.to_string(),
                });
            }
            (Err(e), Ok(text)) => {
                warn!(error = %e, degraded = true, "Semantic search failed, using text results only");
                Span::current().record(logging::DEGRADED, true);
                (Vec::new(), text)
            }
            (Ok(Some(semantic)), Err(e)) => {
                warn!(error = %e, degraded = true, "Text search failed, using semantic results only");
                Span::current().record(logging::DEGRADED, true);
                (semantic, Vec::new())
            }
            (Ok(semantic), Ok(text)) => (semantic.unwrap_or_default(), text),
        };

        let semantic_hits = semantic.len();
        let text_hits = text.len();
        let fused = fuse(semantic, text, limit);
        let fused_count = fused.len();
        let results = apply_post_filters(fused, &filters);
        Span::current().record(logging::RESULT_COUNT, results.len());

        info!(
            semantic_hits,
            text_hits,
            filtered_out = fused_count - results.len(),
            result_count = results.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Hybrid search completed"
        );
        Ok(results)
    }

    /// Embed the residual terms and look up nearest items. `None` when there
    /// are no residual terms and the path did not run.
    async fn semantic_search(
        &self,
        filters: &QueryFilters,
        k: usize,
    ) -> Result<Option<Vec<SearchResult>>> {
        if !filters.has_search_terms() {
            debug!("No residual terms, skipping semantic search");
            return Ok(None);
        }

        let embedding = self.adapter.embed(&filters.search_terms).await?;
        let hits = self
            .vectors
            .query(&self.settings.vector_collection, &embedding, k)
            .await?;
        if hits.is_empty() {
            return Ok(Some(Vec::new()));
        }

        let scored: Vec<(Uuid, f32)> = hits
            .iter()
            .filter_map(|hit| match Uuid::parse_str(&hit.id) {
                Ok(id) => Some((id, similarity_from_distance(hit.distance))),
                Err(_) => {
                    debug!(vector_id = %hit.id, "Skipping vector hit with non-UUID id");
                    None
                }
            })
            .collect();
        let ids: Vec<Uuid> = scored.iter().map(|(id, _)| *id).collect();

        let mut items = self.items.get_by_ids(&ids).await?;
        let results = scored
            .into_iter()
            .filter_map(|(id, score)| {
                let pos = items.iter().position(|item| item.id == id)?;
                Some(SearchResult {
                    item: items.swap_remove(pos),
                    score,
                })
            })
            .collect::<Vec<_>>();

        debug!(
            vector_hits = hits.len(),
            result_count = results.len(),
            "Semantic search complete"
        );
        Ok(Some(results))
    }
}
