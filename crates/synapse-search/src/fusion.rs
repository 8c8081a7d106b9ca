//! Score fusion for semantic and text results.
//!
//! Semantic results are seeded with their similarity. A text match that is
//! already present is boosted to `0.7 * similarity + 0.3`; a text-only match
//! gets the flat base score `0.5`.

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use synapse_core::defaults::{BOTH_PATHS_BONUS, BOTH_PATHS_SEMANTIC_WEIGHT, TEXT_MATCH_BASE_SCORE};
use synapse_core::{Item, SearchResult};

/// Similarity for a vector distance: `1 - d`, floored at zero.
pub fn similarity_from_distance(distance: f32) -> f32 {
    (1.0 - distance).clamp(0.0, 1.0)
}

/// Score for an item found by both paths.
pub fn boosted_score(similarity: f32) -> f32 {
    similarity * BOTH_PATHS_SEMANTIC_WEIGHT + BOTH_PATHS_BONUS
}

/// Merge both result sets keyed by item id, sort by score descending and
/// keep the first `limit`. Ties keep semantic order, then text order.
pub fn fuse(semantic: Vec<SearchResult>, text: Vec<Item>, limit: usize) -> Vec<SearchResult> {
    let mut order: Vec<Uuid> = Vec::with_capacity(semantic.len() + text.len());
    let mut merged: HashMap<Uuid, SearchResult> = HashMap::with_capacity(order.capacity());
    let mut boosted = 0usize;

    for result in semantic {
        if !merged.contains_key(&result.item.id) {
            order.push(result.item.id);
            merged.insert(result.item.id, result);
        }
    }

    for item in text {
        match merged.get_mut(&item.id) {
            Some(existing) => {
                existing.score = boosted_score(existing.score);
                boosted += 1;
            }
            None => {
                order.push(item.id);
                merged.insert(
                    item.id,
                    SearchResult {
                        item,
                        score: TEXT_MATCH_BASE_SCORE,
                    },
                );
            }
        }
    }

    let mut results: Vec<SearchResult> = order
        .into_iter()
        .filter_map(|id| merged.remove(&id))
        .collect();
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(limit);

    debug!(boosted, result_count = results.len(), "Fusion complete");
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use synapse_core::{Category, ContentType};

    fn item(title: &str) -> Item {
        Item {
            id: Uuid::now_v7(),
            title: title.to_string(),
            content: String::new(),
            summary: String::new(),
            category: Category::Other,
            tags: Vec::new(),
            source_url: None,
            content_type: ContentType::Note,
            embedding_id: None,
            image_url: None,
            embed_html: None,
            created_at: Utc::now(),
        }
    }

    fn semantic(item: &Item, score: f32) -> SearchResult {
        SearchResult {
            item: item.clone(),
            score,
        }
    }

    #[test]
    fn test_similarity_from_distance() {
        assert_eq!(similarity_from_distance(0.0), 1.0);
        assert!((similarity_from_distance(0.25) - 0.75).abs() < 1e-6);
        assert_eq!(similarity_from_distance(1.4), 0.0);
    }

    #[test]
    fn test_item_in_both_paths_is_boosted() {
        let a = item("a");
        let results = fuse(vec![semantic(&a, 0.9)], vec![a.clone()], 10);
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 0.93).abs() < 1e-6);
    }

    #[test]
    fn test_text_only_gets_base_score() {
        let a = item("a");
        let b = item("b");
        let results = fuse(Vec::new(), vec![a, b], 10);
        assert!(results.iter().all(|r| r.score == TEXT_MATCH_BASE_SCORE));
        assert_eq!(results[0].item.title, "a");
    }

    #[test]
    fn test_boost_strictly_exceeds_semantic_alone() {
        for step in 0..100 {
            let similarity = step as f32 / 100.0;
            assert!(
                boosted_score(similarity) > similarity,
                "similarity {}",
                similarity
            );
        }
    }

    #[test]
    fn test_sorted_and_limited() {
        let a = item("a");
        let b = item("b");
        let c = item("c");
        let results = fuse(
            vec![semantic(&a, 0.2), semantic(&b, 0.8)],
            vec![a.clone(), c.clone()],
            2,
        );

        let titles: Vec<_> = results.iter().map(|r| r.item.title.as_str()).collect();
        // b = 0.8, c = 0.5, a = 0.2 * 0.7 + 0.3 = 0.44
        assert_eq!(titles, vec!["b", "c"]);
    }
}
