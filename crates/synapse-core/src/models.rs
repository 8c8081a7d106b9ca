//! Data models for captured items and search.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

// =============================================================================
// CONTENT TYPE
// =============================================================================

/// Fixed vocabulary of item content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Url,
    Video,
    Amazon,
    Blog,
    Book,
    Recipe,
    Image,
    Note,
}

impl ContentType {
    pub const ALL: [ContentType; 8] = [
        Self::Url,
        Self::Video,
        Self::Amazon,
        Self::Blog,
        Self::Book,
        Self::Recipe,
        Self::Image,
        Self::Note,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Video => "video",
            Self::Amazon => "amazon",
            Self::Blog => "blog",
            Self::Book => "book",
            Self::Recipe => "recipe",
            Self::Image => "image",
            Self::Note => "note",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown content type: {}", s)))
    }
}

// =============================================================================
// CATEGORY
// =============================================================================

/// Fixed set of categories an item can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    #[serde(rename = "Technology")]
    Technology,
    #[serde(rename = "Food & Recipes")]
    FoodAndRecipes,
    #[serde(rename = "Books & Reading")]
    BooksAndReading,
    #[serde(rename = "Videos & Entertainment")]
    VideosAndEntertainment,
    #[serde(rename = "Shopping & Products")]
    ShoppingAndProducts,
    #[serde(rename = "Articles & News")]
    ArticlesAndNews,
    #[serde(rename = "Notes & Ideas")]
    NotesAndIdeas,
    #[serde(rename = "Design & Inspiration")]
    DesignAndInspiration,
    #[serde(rename = "Travel")]
    Travel,
    #[serde(rename = "Health & Fitness")]
    HealthAndFitness,
    #[serde(rename = "Education & Learning")]
    EducationAndLearning,
    #[default]
    #[serde(rename = "Other")]
    Other,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Self::Technology,
        Self::FoodAndRecipes,
        Self::BooksAndReading,
        Self::VideosAndEntertainment,
        Self::ShoppingAndProducts,
        Self::ArticlesAndNews,
        Self::NotesAndIdeas,
        Self::DesignAndInspiration,
        Self::Travel,
        Self::HealthAndFitness,
        Self::EducationAndLearning,
        Self::Other,
    ];

    /// Human-readable label, also used in prompts and storage.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Technology => "Technology",
            Self::FoodAndRecipes => "Food & Recipes",
            Self::BooksAndReading => "Books & Reading",
            Self::VideosAndEntertainment => "Videos & Entertainment",
            Self::ShoppingAndProducts => "Shopping & Products",
            Self::ArticlesAndNews => "Articles & News",
            Self::NotesAndIdeas => "Notes & Ideas",
            Self::DesignAndInspiration => "Design & Inspiration",
            Self::Travel => "Travel",
            Self::HealthAndFitness => "Health & Fitness",
            Self::EducationAndLearning => "Education & Learning",
            Self::Other => "Other",
        }
    }

    /// Match a label case-insensitively. Unrecognized labels become `Other`.
    pub fn from_label(label: &str) -> Self {
        let wanted = label.trim().trim_matches(|c| c == '"' || c == '.').to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.label().to_lowercase() == wanted)
            .unwrap_or(Self::Other)
    }

    /// Image search term for generic preview images.
    pub fn image_search_term(&self) -> &'static str {
        match self {
            Self::Technology => "technology",
            Self::FoodAndRecipes => "food",
            Self::BooksAndReading => "books",
            Self::VideosAndEntertainment => "entertainment",
            Self::ShoppingAndProducts => "product",
            Self::ArticlesAndNews => "news",
            Self::NotesAndIdeas => "notebook",
            Self::DesignAndInspiration => "design",
            Self::Travel => "travel",
            Self::HealthAndFitness => "fitness",
            Self::EducationAndLearning => "education",
            Self::Other => "abstract",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// CAPTURE
// =============================================================================

/// Raw content submitted for ingestion. Lives only for one `create_item` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapturedInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default, rename = "type")]
    pub type_hint: Option<ContentType>,
    /// Caller-supplied hints such as `image` or `thumbnail`.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CapturedInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_type(mut self, content_type: ContentType) -> Self {
        self.type_hint = Some(content_type);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Content to enrich and store: the raw content, or the title when empty.
    pub fn effective_content(&self) -> &str {
        if self.content.trim().is_empty() {
            &self.title
        } else {
            &self.content
        }
    }

    /// Source URL with surrounding whitespace removed, if non-empty.
    pub fn source_url(&self) -> Option<&str> {
        self.source_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

// =============================================================================
// ITEM
// =============================================================================

/// A persisted captured unit of content plus derived metadata.
///
/// Items are immutable once created; the only lifecycle change is deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub source_url: Option<String>,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    /// Vector-store id for this item; `None` when the vector write failed.
    pub embedding_id: Option<String>,
    pub image_url: Option<String>,
    pub embed_html: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// SEARCH
// =============================================================================

/// An item matched by a search, with a similarity score in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub item: Item,
    pub score: f32,
}

/// Structured filters extracted from a free-text query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilters {
    /// Residual search terms left after extraction (may be empty).
    pub search_terms: String,
    pub content_type: Option<ContentType>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    /// Required tags, matched with OR semantics.
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
}

impl QueryFilters {
    /// Filters carrying only residual terms.
    pub fn terms(terms: impl Into<String>) -> Self {
        Self {
            search_terms: terms.into(),
            ..Default::default()
        }
    }

    pub fn has_search_terms(&self) -> bool {
        !self.search_terms.trim().is_empty()
    }

    pub fn has_price_bounds(&self) -> bool {
        self.price_min.is_some() || self.price_max.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_roundtrip_str() {
        for t in ContentType::ALL {
            assert_eq!(t.as_str().parse::<ContentType>().unwrap(), t);
        }
        assert_eq!("  Video ".parse::<ContentType>().unwrap(), ContentType::Video);
        assert!("podcast".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_content_type_serde_lowercase() {
        let json = serde_json::to_string(&ContentType::Recipe).unwrap();
        assert_eq!(json, "\"recipe\"");
    }

    #[test]
    fn test_category_from_label() {
        assert_eq!(Category::from_label("Technology"), Category::Technology);
        assert_eq!(
            Category::from_label("  food & recipes\n"),
            Category::FoodAndRecipes
        );
        assert_eq!(Category::from_label("\"Travel\"."), Category::Travel);
        assert_eq!(Category::from_label("Astrology"), Category::Other);
    }

    #[test]
    fn test_category_serde_uses_label() {
        let json = serde_json::to_string(&Category::BooksAndReading).unwrap();
        assert_eq!(json, "\"Books & Reading\"");
    }

    #[test]
    fn test_category_search_terms() {
        assert_eq!(Category::FoodAndRecipes.image_search_term(), "food");
        assert_eq!(Category::Other.image_search_term(), "abstract");
    }

    #[test]
    fn test_effective_content_falls_back_to_title() {
        let input = CapturedInput::new("A title", "   ");
        assert_eq!(input.effective_content(), "A title");

        let input = CapturedInput::new("A title", "Body");
        assert_eq!(input.effective_content(), "Body");
    }

    #[test]
    fn test_captured_input_deserialize() {
        let input: CapturedInput = serde_json::from_str(
            r#"{"title":"t","content":"c","type":"video","metadata":{"thumbnail":"x.jpg"}}"#,
        )
        .unwrap();
        assert_eq!(input.type_hint, Some(ContentType::Video));
        assert_eq!(input.metadata.get("thumbnail").unwrap(), "x.jpg");
        assert!(input.source_url().is_none());
    }

    #[test]
    fn test_query_filters_flags() {
        let filters = QueryFilters::terms("  ");
        assert!(!filters.has_search_terms());
        assert!(!filters.has_price_bounds());

        let filters = QueryFilters {
            price_max: Some(50.0),
            ..QueryFilters::terms("headphones")
        };
        assert!(filters.has_search_terms());
        assert!(filters.has_price_bounds());
    }
}
