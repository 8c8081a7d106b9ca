//! SQL generation for filtered item search.
//!
//! Turns [`QueryFilters`] into a parameterized WHERE clause over the `items`
//! table. Residual terms match title, content or summary; the type filter is
//! applied only when there are no residual terms.

use chrono::{DateTime, Utc};

use synapse_core::QueryFilters;

/// Type-safe parameter binding for SQL queries.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    String(String),
    StringArray(Vec<String>),
    Timestamp(DateTime<Utc>),
}

/// Escape LIKE wildcards so user text matches literally.
fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Builds the WHERE clause for `search_items`.
pub struct ItemFilterQueryBuilder<'a> {
    filters: &'a QueryFilters,
    param_offset: usize,
}

impl<'a> ItemFilterQueryBuilder<'a> {
    /// `param_offset` is the number of parameters already bound before the clause.
    pub fn new(filters: &'a QueryFilters, param_offset: usize) -> Self {
        Self {
            filters,
            param_offset,
        }
    }

    /// Returns the clause (`"TRUE"` when no filter applies) and its parameters in order.
    pub fn build(&self) -> (String, Vec<QueryParam>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        let mut idx = self.param_offset;

        let terms = self.filters.search_terms.trim();
        if !terms.is_empty() {
            idx += 1;
            clauses.push(format!(
                "(title ILIKE ${0} OR content ILIKE ${0} OR summary ILIKE ${0})",
                idx
            ));
            params.push(QueryParam::String(like_pattern(terms)));
        } else if let Some(content_type) = self.filters.content_type {
            idx += 1;
            clauses.push(format!("type = ${}", idx));
            params.push(QueryParam::String(content_type.as_str().to_string()));
        }

        if let Some(from) = self.filters.date_from {
            idx += 1;
            clauses.push(format!("created_at >= ${}", idx));
            params.push(QueryParam::Timestamp(from));
        }

        if let Some(to) = self.filters.date_to {
            idx += 1;
            clauses.push(format!("created_at <= ${}", idx));
            params.push(QueryParam::Timestamp(to));
        }

        if !self.filters.tags.is_empty() {
            idx += 1;
            clauses.push(format!("tags && ${}::text[]", idx));
            params.push(QueryParam::StringArray(self.filters.tags.clone()));
        }

        if let Some(author) = self.filters.author.as_deref().map(str::trim) {
            if !author.is_empty() {
                idx += 1;
                clauses.push(format!("(content ILIKE ${0} OR title ILIKE ${0})", idx));
                params.push(QueryParam::String(like_pattern(author)));
            }
        }

        if clauses.is_empty() {
            ("TRUE".to_string(), params)
        } else {
            (clauses.join(" AND "), params)
        }
    }
}
