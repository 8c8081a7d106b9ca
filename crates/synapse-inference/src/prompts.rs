//! Prompt templates and response parsers for enrichment calls.

use synapse_core::Category;

/// Prompt asking for a short summary of `content`.
pub fn summary_prompt(content: &str) -> String {
    format!(
        "Summarize the following content in 2-3 concise sentences. Focus on the key points:\n\n{}",
        content
    )
}

/// Prompt asking for 3-5 comma-separated tags.
pub fn tags_prompt(content: &str) -> String {
    format!(
        "Extract 3-5 relevant tags for this content. Return only comma-separated tags, \
         no explanations, no numbering, just tags separated by commas:\n\n{}",
        content
    )
}

/// Prompt asking for exactly one label from the fixed category set.
pub fn category_prompt(title: &str, content_type: &str, content: &str) -> String {
    let choices: String = Category::ALL
        .iter()
        .map(|c| format!("- {}\n", c.label()))
        .collect();

    format!(
        "Categorize this content into ONE of these specific sections:\n{}\n\
         Title: {}\nType: {}\nContent: {}\n\n\
         Return ONLY the category name, nothing else.",
        choices, title, content_type, content
    )
}

/// Parse a comma-separated tag response.
///
/// Entries are trimmed, empty entries dropped, and case-insensitive
/// duplicates removed keeping the first occurrence.
pub fn parse_tags(response: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    response
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Parse a category response: first non-empty line, matched against the fixed set.
pub fn parse_category(response: &str) -> Category {
    response
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(Category::from_label)
        .unwrap_or_default()
}
