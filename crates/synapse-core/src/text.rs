//! Character-budget helpers shared by the provider adapter and the pipeline.
//!
//! All budgets are counted in `char`s so truncation never splits a UTF-8
//! sequence.

/// Marker appended to text shortened by [`summary_fallback`].
pub const ELLIPSIS: &str = "...";

/// Return the longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Summary used when generation fails: the first `budget` characters of
/// `content`, with [`ELLIPSIS`] appended only when something was cut.
pub fn summary_fallback(content: &str, budget: usize) -> String {
    let prefix = truncate_chars(content, budget);
    if prefix.len() < content.len() {
        format!("{}{}", prefix, ELLIPSIS)
    } else {
        prefix.to_string()
    }
}
