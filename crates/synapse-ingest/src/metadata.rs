//! Metadata enrichment: preview image, embed markup and inferred type.
//!
//! Resolution is a first-success chain. Every network lookup is independent,
//! best-effort and bounded by [`MetadataSettings::lookup_timeout`]:
//!
//! 1. Caller-supplied `image` / `thumbnail` metadata wins outright.
//! 2. YouTube source URLs get an iframe embed and thumbnail (no network).
//! 3. Other source URLs are fetched for `og:image`, then `twitter:image`.
//! 4. Book heuristic: cover by ISBN (HEAD check), else Open Library title search.
//! 5. Recipe heuristic: generic recipe image.
//! 6. Category image from the category's search term.
//!
//! The book check always runs before the recipe check. Content such as
//! "a cookbook I read" matches both keyword sets and is classified as a book.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use synapse_core::{CapturedInput, Category, ContentType, MetadataSettings, Result};

use crate::page_fetch::PageFetcher;

/// Keywords marking content as book-related (lowercase substring match).
pub const BOOK_KEYWORDS: [&str; 7] = [
    "book",
    "author",
    "published",
    "isbn",
    "chapter",
    "novel",
    "read",
];

/// Keywords marking content as a recipe (lowercase substring match).
pub const RECIPE_KEYWORDS: [&str; 10] = [
    "recipe",
    "ingredients",
    "cook",
    "bake",
    "prep time",
    "servings",
    "cups",
    "tablespoons",
    "tsp",
    "tbsp",
];

/// Caller metadata keys that carry a ready-made image URL.
const CALLER_IMAGE_KEYS: [&str; 2] = ["image", "thumbnail"];

static YOUTUBE_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"youtube\.com/watch\?(?:[^#\s]*&)?v=([a-zA-Z0-9_-]+)",
        r"youtu\.be/([a-zA-Z0-9_-]+)",
        r"youtube\.com/embed/([a-zA-Z0-9_-]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("YouTube pattern is valid"))
    .collect()
});

static OG_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\s+property=["']og:image["']\s+content=["']([^"']+)["']"#)
        .expect("og:image pattern is valid")
});

static TWITTER_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\s+name=["']twitter:image["']\s+content=["']([^"']+)["']"#)
        .expect("twitter:image pattern is valid")
});

// ISBN-13, ISBN-10, then a bare 13-digit number.
static ISBN_PATTERNS: Lazy<Vec<(Regex, usize)>> = Lazy::new(|| {
    [
        (r"(?i)ISBN(?:-?13)?[:\s]*((?:[0-9][-\s]?){12}[0-9])", 13),
        (r"(?i)ISBN(?:-?10)?[:\s]*((?:[0-9][-\s]?){9}[0-9Xx])", 10),
        (r"\b([0-9]{3}[-\s]?[0-9]{10})\b", 13),
    ]
    .iter()
    .map(|(p, len)| (Regex::new(p).expect("ISBN pattern is valid"), *len))
    .collect()
});

// =============================================================================
// REQUEST / RESULT
// =============================================================================

/// Inputs to one metadata resolution.
#[derive(Debug, Clone)]
pub struct MetadataRequest<'a> {
    pub title: &'a str,
    pub content: &'a str,
    /// Caller's type hint; inference only happens when this is `None`.
    pub content_type: Option<ContentType>,
    pub source_url: Option<&'a str>,
    pub caller_metadata: &'a HashMap<String, String>,
    pub category: Category,
}

impl<'a> MetadataRequest<'a> {
    /// Build a request from captured input, using its effective content.
    pub fn from_input(input: &'a CapturedInput, category: Category) -> Self {
        Self {
            title: input.title.trim(),
            content: input.effective_content(),
            content_type: input.type_hint,
            source_url: input.source_url(),
            caller_metadata: &input.metadata,
            category,
        }
    }
}

/// Outcome of metadata resolution. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedMetadata {
    pub embed_html: Option<String>,
    pub image_url: Option<String>,
    /// Type inferred from the content, set only when the caller gave none.
    pub inferred_type: Option<ContentType>,
}

#[derive(Deserialize)]
struct OpenLibrarySearch {
    #[serde(default)]
    docs: Vec<OpenLibraryDoc>,
}

#[derive(Deserialize)]
struct OpenLibraryDoc {
    #[serde(default)]
    cover_i: Option<i64>,
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Resolves preview images and embed markup for captured items.
#[derive(Clone)]
pub struct MetadataResolver {
    fetcher: Arc<dyn PageFetcher>,
    settings: MetadataSettings,
}

impl MetadataResolver {
    pub fn new(fetcher: Arc<dyn PageFetcher>, settings: MetadataSettings) -> Self {
        Self { fetcher, settings }
    }

    /// Run the resolution chain. Never fails; lookups that error or time out
    /// are logged and skipped.
    #[instrument(skip(self, request), fields(subsystem = "ingest", component = "metadata", op = "resolve", category = %request.category))]
    pub async fn resolve(&self, request: &MetadataRequest<'_>) -> ResolvedMetadata {
        if let Some(image) = caller_image(request.caller_metadata) {
            debug!(step = "caller", "Using caller-supplied image");
            return ResolvedMetadata {
                image_url: Some(image.to_string()),
                ..Default::default()
            };
        }

        if let Some(url) = request.source_url {
            if let Some(video_id) = youtube_video_id(url) {
                debug!(step = "youtube", video_id, "Resolved video embed");
                return ResolvedMetadata {
                    embed_html: Some(youtube_embed(video_id)),
                    image_url: Some(youtube_thumbnail(video_id)),
                    inferred_type: infer(request, ContentType::Video),
                };
            }

            if let Some(image) = self.page_preview_image(url).await {
                debug!(step = "page", "Resolved page preview image");
                return ResolvedMetadata {
                    embed_html: Some(preview_fragment(&image)),
                    image_url: Some(image),
                    inferred_type: None,
                };
            }
        }

        if mentions_any(request.title, request.content, &BOOK_KEYWORDS) {
            if let Some(cover) = self.book_cover(request).await {
                debug!(step = "book", "Resolved book cover");
                return ResolvedMetadata {
                    image_url: Some(cover),
                    inferred_type: infer(request, ContentType::Book),
                    ..Default::default()
                };
            }
        }

        if mentions_any(request.title, request.content, &RECIPE_KEYWORDS) {
            debug!(step = "recipe", "Using generic recipe image");
            return ResolvedMetadata {
                image_url: Some(self.generic_image("recipe", request.title)),
                inferred_type: infer(request, ContentType::Recipe),
                ..Default::default()
            };
        }

        debug!(step = "category", "Using category image");
        ResolvedMetadata {
            image_url: Some(
                self.generic_image(request.category.image_search_term(), request.title),
            ),
            ..Default::default()
        }
    }

    async fn page_preview_image(&self, url: &str) -> Option<String> {
        let html = self.bounded("page", self.fetcher.get_text(url)).await?;
        extract_preview_image(&html)
    }

    async fn book_cover(&self, request: &MetadataRequest<'_>) -> Option<String> {
        if let Some(isbn) = extract_isbn(request.content) {
            let cover = format!(
                "{}/b/isbn/{}-L.jpg",
                self.settings.open_library_covers_url.trim_end_matches('/'),
                isbn
            );
            if self.bounded("isbn_cover", self.fetcher.head_ok(&cover)).await == Some(true) {
                return Some(cover);
            }
            debug!(isbn = %isbn, "No cover for ISBN, searching by title");
        }

        if request.title.is_empty() {
            return None;
        }
        let search_url = format!(
            "{}/search.json?title={}&limit=1",
            self.settings.open_library_search_url.trim_end_matches('/'),
            plus_joined(request.title)
        );
        let body = self.bounded("title_search", self.fetcher.get_json(&search_url)).await?;
        let search: OpenLibrarySearch = serde_json::from_value(body).ok()?;
        let cover_id = search.docs.first()?.cover_i.filter(|id| *id > 0)?;
        Some(format!(
            "{}/b/id/{}-L.jpg",
            self.settings.open_library_covers_url.trim_end_matches('/'),
            cover_id
        ))
    }

    fn generic_image(&self, term: &str, title: &str) -> String {
        let base = self.settings.image_source_url.trim_end_matches('/');
        if title.is_empty() {
            format!("{}/400x300/?{}", base, term)
        } else {
            format!("{}/400x300/?{},{}", base, term, plus_joined(title))
        }
    }

    /// Await one lookup under the per-lookup timeout, logging failures.
    async fn bounded<T>(&self, lookup: &str, fut: impl Future<Output = Result<T>>) -> Option<T> {
        match tokio::time::timeout(self.settings.lookup_timeout(), fut).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!(
                    subsystem = "ingest",
                    component = "metadata",
                    lookup,
                    error = %e,
                    "Metadata lookup failed, continuing"
                );
                None
            }
            Err(_) => {
                warn!(
                    subsystem = "ingest",
                    component = "metadata",
                    lookup,
                    timeout_secs = self.settings.lookup_timeout_secs,
                    "Metadata lookup timed out, continuing"
                );
                None
            }
        }
    }
}

fn infer(request: &MetadataRequest<'_>, content_type: ContentType) -> Option<ContentType> {
    request.content_type.is_none().then_some(content_type)
}

fn caller_image(metadata: &HashMap<String, String>) -> Option<&str> {
    CALLER_IMAGE_KEYS
        .iter()
        .filter_map(|key| metadata.get(*key))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
}

// =============================================================================
// EXTRACTION HELPERS
// =============================================================================

/// Video id from a YouTube watch, short or embed URL.
pub fn youtube_video_id(url: &str) -> Option<&str> {
    YOUTUBE_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url).and_then(|c| c.get(1)))
        .map(|m| m.as_str())
}

pub fn youtube_embed(video_id: &str) -> String {
    format!(
        r#"<iframe width="560" height="315" src="https://www.youtube.com/embed/{}" frameborder="0" allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture" allowfullscreen></iframe>"#,
        video_id
    )
}

pub fn youtube_thumbnail(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", video_id)
}

/// First `og:image`, else `twitter:image`, found in page markup.
pub fn extract_preview_image(html: &str) -> Option<String> {
    [&*OG_IMAGE, &*TWITTER_IMAGE]
        .iter()
        .find_map(|re| re.captures(html).and_then(|c| c.get(1)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Minimal HTML preview wrapping an image URL.
pub fn preview_fragment(image_url: &str) -> String {
    format!(
        r#"<div class="url-preview"><img src="{}" alt="Preview" style="max-width: 100%; border-radius: 8px;" /></div>"#,
        image_url
    )
}

/// ISBN with separators removed. Tries ISBN-13, ISBN-10, then any 13-digit run.
pub fn extract_isbn(text: &str) -> Option<String> {
    ISBN_PATTERNS.iter().find_map(|(re, len)| {
        re.captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| {
                m.as_str()
                    .chars()
                    .filter(|c| !matches!(c, '-' | ' ' | '\t'))
                    .collect::<String>()
                    .to_uppercase()
            })
            .find(|isbn| isbn.len() == *len)
    })
}

/// Case-insensitive substring match of any keyword against title or content.
pub fn mentions_any(title: &str, content: &str, keywords: &[&str]) -> bool {
    let title = title.to_lowercase();
    let content = content.to_lowercase();
    keywords
        .iter()
        .any(|k| title.contains(k) || content.contains(k))
}

/// Words percent-encoded and joined with `+`, for search query strings.
fn plus_joined(text: &str) -> String {
    text.split_whitespace()
        .map(|w| urlencoding::encode(w).into_owned())
        .collect::<Vec<_>>()
        .join("+")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePageFetcher;

    fn resolver(fetcher: FakePageFetcher) -> MetadataResolver {
        let settings = MetadataSettings {
            open_library_covers_url: "https://covers.test".to_string(),
            open_library_search_url: "https://search.test".to_string(),
            image_source_url: "https://images.test".to_string(),
            ..MetadataSettings::default()
        };
        MetadataResolver::new(Arc::new(fetcher), settings)
    }

    fn request<'a>(
        title: &'a str,
        content: &'a str,
        source_url: Option<&'a str>,
        metadata: &'a HashMap<String, String>,
    ) -> MetadataRequest<'a> {
        MetadataRequest {
            title,
            content,
            content_type: None,
            source_url,
            caller_metadata: metadata,
            category: Category::Other,
        }
    }

    #[test]
    fn test_youtube_video_id_variants() {
        assert_eq!(
            youtube_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            youtube_video_id("https://www.youtube.com/watch?list=PL1&v=abc_123-x"),
            Some("abc_123-x")
        );
        assert_eq!(youtube_video_id("https://youtu.be/dQw4w9WgXcQ?t=3"), Some("dQw4w9WgXcQ"));
        assert_eq!(
            youtube_video_id("https://youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(youtube_video_id("https://vimeo.com/12345"), None);
    }

    #[test]
    fn test_extract_preview_image_prefers_og() {
        let html = r#"<head>
            <meta name="twitter:image" content="https://x.test/tw.png">
            <meta property="og:image" content="https://x.test/og.png">
        </head>"#;
        assert_eq!(extract_preview_image(html).as_deref(), Some("https://x.test/og.png"));

        let html = r#"<meta name='twitter:image' content='https://x.test/tw.png'>"#;
        assert_eq!(extract_preview_image(html).as_deref(), Some("https://x.test/tw.png"));

        assert_eq!(extract_preview_image("<html></html>"), None);
    }

    #[test]
    fn test_extract_isbn_patterns() {
        assert_eq!(
            extract_isbn("Great book by Jane Austen, ISBN 9780141439518").as_deref(),
            Some("9780141439518")
        );
        assert_eq!(
            extract_isbn("isbn: 978-0-14-143951-8").as_deref(),
            Some("9780141439518")
        );
        assert_eq!(extract_isbn("ISBN-10: 0-14-143951-3").as_deref(), Some("0141439513"));
        assert_eq!(extract_isbn("ISBN 080442957x").as_deref(), Some("080442957X"));
        assert_eq!(extract_isbn("code 978 0141439518 here").as_deref(), Some("9780141439518"));
        assert_eq!(extract_isbn("no numbers here"), None);
    }

    #[test]
    fn test_mentions_any_checks_title_and_content() {
        assert!(mentions_any("My Novel", "", &BOOK_KEYWORDS));
        assert!(mentions_any("", "Bake at 180C", &RECIPE_KEYWORDS));
        assert!(!mentions_any("Trip", "Beach day", &RECIPE_KEYWORDS));
    }

    #[tokio::test]
    async fn test_caller_image_wins_without_lookups() {
        let fetcher = FakePageFetcher::new();
        let resolver = resolver(fetcher.clone());
        let metadata = HashMap::from([("thumbnail".to_string(), "https://cdn.test/t.jpg".to_string())]);

        let resolved = resolver
            .resolve(&request("A book", "novel", Some("https://blog.test/post"), &metadata))
            .await;

        assert_eq!(resolved.image_url.as_deref(), Some("https://cdn.test/t.jpg"));
        assert_eq!(resolved.embed_html, None);
        assert_eq!(resolved.inferred_type, None);
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_youtube_embed_infers_video() {
        let fetcher = FakePageFetcher::new();
        let resolver = resolver(fetcher.clone());
        let metadata = HashMap::new();

        let resolved = resolver
            .resolve(&request("", "watch this", Some("https://youtu.be/abc123"), &metadata))
            .await;

        assert!(resolved
            .embed_html
            .as_deref()
            .unwrap()
            .contains("https://www.youtube.com/embed/abc123"));
        assert_eq!(
            resolved.image_url.as_deref(),
            Some("https://img.youtube.com/vi/abc123/maxresdefault.jpg")
        );
        assert_eq!(resolved.inferred_type, Some(ContentType::Video));
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_type_hint_suppresses_inference() {
        let resolver = resolver(FakePageFetcher::new());
        let metadata = HashMap::new();
        let mut req = request("", "", Some("https://youtu.be/abc123"), &metadata);
        req.content_type = Some(ContentType::Note);

        let resolved = resolver.resolve(&req).await;
        assert!(resolved.embed_html.is_some());
        assert_eq!(resolved.inferred_type, None);
    }

    #[tokio::test]
    async fn test_page_og_image_wrapped_in_preview() {
        let fetcher = FakePageFetcher::new().with_page(
            "https://blog.test/post",
            r#"<meta property="og:image" content="https://blog.test/hero.png">"#,
        );
        let resolver = resolver(fetcher);
        let metadata = HashMap::new();

        let resolved = resolver
            .resolve(&request("Post", "text", Some("https://blog.test/post"), &metadata))
            .await;

        assert_eq!(resolved.image_url.as_deref(), Some("https://blog.test/hero.png"));
        assert_eq!(
            resolved.embed_html.as_deref(),
            Some(preview_fragment("https://blog.test/hero.png").as_str())
        );
        assert_eq!(resolved.inferred_type, None);
    }

    #[tokio::test]
    async fn test_page_failure_falls_through_to_category() {
        // No page registered: the fetch errors and the chain continues.
        let resolver = resolver(FakePageFetcher::new());
        let metadata = HashMap::new();
        let mut req = request("Trip notes", "Lisbon", Some("https://down.test"), &metadata);
        req.category = Category::Travel;

        let resolved = resolver.resolve(&req).await;
        assert_eq!(
            resolved.image_url.as_deref(),
            Some("https://images.test/400x300/?travel,Trip+notes")
        );
        assert_eq!(resolved.embed_html, None);
    }

    #[tokio::test]
    async fn test_book_cover_by_isbn() {
        let fetcher = FakePageFetcher::new()
            .with_head_ok("https://covers.test/b/isbn/9780141439518-L.jpg");
        let resolver = resolver(fetcher);
        let metadata = HashMap::new();

        let resolved = resolver
            .resolve(&request(
                "",
                "Great book by Jane Austen, ISBN 9780141439518",
                None,
                &metadata,
            ))
            .await;

        assert_eq!(
            resolved.image_url.as_deref(),
            Some("https://covers.test/b/isbn/9780141439518-L.jpg")
        );
        assert_eq!(resolved.inferred_type, Some(ContentType::Book));
    }

    #[tokio::test]
    async fn test_missing_isbn_cover_searches_by_title() {
        let fetcher = FakePageFetcher::new().with_json(
            "https://search.test/search.json?title=Pride+and+Prejudice&limit=1",
            serde_json::json!({"docs": [{"cover_i": 8231856}]}),
        );
        let resolver = resolver(fetcher.clone());
        let metadata = HashMap::new();

        let resolved = resolver
            .resolve(&request(
                "Pride and Prejudice",
                "Novel, ISBN 9780141439518",
                None,
                &metadata,
            ))
            .await;

        assert_eq!(
            resolved.image_url.as_deref(),
            Some("https://covers.test/b/id/8231856-L.jpg")
        );
        assert_eq!(resolved.inferred_type, Some(ContentType::Book));
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_book_without_cover_falls_to_recipe() {
        // "read" and "cook" both match; the book lookup finds nothing.
        let fetcher = FakePageFetcher::new().with_json(
            "https://search.test/search.json?title=Weeknight+dinners&limit=1",
            serde_json::json!({"docs": [{"cover_i": 0}]}),
        );
        let resolver = resolver(fetcher);
        let metadata = HashMap::new();

        let resolved = resolver
            .resolve(&request("Weeknight dinners", "I read this, now cook it", None, &metadata))
            .await;

        assert_eq!(
            resolved.image_url.as_deref(),
            Some("https://images.test/400x300/?recipe,Weeknight+dinners")
        );
        assert_eq!(resolved.inferred_type, Some(ContentType::Recipe));
    }

    #[tokio::test]
    async fn test_book_precedes_recipe() {
        let fetcher = FakePageFetcher::new().with_json(
            "https://search.test/search.json?title=The+Cookbook&limit=1",
            serde_json::json!({"docs": [{"cover_i": 42}]}),
        );
        let resolver = resolver(fetcher);
        let metadata = HashMap::new();

        let resolved = resolver
            .resolve(&request("The Cookbook", "A book of recipes", None, &metadata))
            .await;

        assert_eq!(resolved.inferred_type, Some(ContentType::Book));
    }

    #[tokio::test]
    async fn test_category_fallback_defaults_to_abstract() {
        let resolver = resolver(FakePageFetcher::new());
        let metadata = HashMap::new();

        let resolved = resolver
            .resolve(&request("", "Remember the milk", None, &metadata))
            .await;

        assert_eq!(
            resolved.image_url.as_deref(),
            Some("https://images.test/400x300/?abstract")
        );
        assert_eq!(resolved.inferred_type, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_lookup_is_abandoned() {
        let fetcher = FakePageFetcher::new()
            .with_page("https://slow.test", r#"<meta property="og:image" content="x.png">"#)
            .with_latency_ms(60_000);
        let resolver = resolver(fetcher);
        let metadata = HashMap::new();

        let resolved = resolver
            .resolve(&request("", "plain", Some("https://slow.test"), &metadata))
            .await;

        assert_eq!(
            resolved.image_url.as_deref(),
            Some("https://images.test/400x300/?abstract")
        );
    }
}
