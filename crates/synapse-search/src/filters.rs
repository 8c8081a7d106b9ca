//! Post-filters applied after fusion.
//!
//! Only the price range lives here; every other filter is pushed down to the
//! relational store.

use once_cell::sync::Lazy;
use regex::Regex;

use synapse_core::{QueryFilters, SearchResult};

static PRICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)price[:\s]+\$?(\d+(?:\.\d+)?)").expect("price pattern is valid")
});

/// First `price: $NNN.NN` style amount found in `content`.
pub fn extract_price(content: &str) -> Option<f64> {
    PRICE
        .captures(content)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Whether `content` satisfies the filters' price bounds.
///
/// Content without a parseable price always passes.
pub fn within_price_bounds(content: &str, filters: &QueryFilters) -> bool {
    let Some(price) = extract_price(content) else {
        return true;
    };
    filters.price_min.map_or(true, |min| price >= min)
        && filters.price_max.map_or(true, |max| price <= max)
}

/// Drop results whose content price falls outside the requested range.
pub fn apply_post_filters(results: Vec<SearchResult>, filters: &QueryFilters) -> Vec<SearchResult> {
    if !filters.has_price_bounds() {
        return results;
    }
    results
        .into_iter()
        .filter(|r| within_price_bounds(&r.item.content, filters))
        .collect()
}
