//! Query interpretation: free text to [`QueryFilters`].
//!
//! Pattern rules pull structured hints out of the raw query and leave the
//! remainder as residual search terms:
//!
//! | Hint   | Forms |
//! |--------|-------|
//! | tags   | `tag:x`, `tags:x,y`, `#x` |
//! | type   | `type:video` (unknown types are dropped) |
//! | author | `author:name`, `author:"Full Name"`, `by Capitalized Name` |
//! | price  | `under/below/less than $X`, `over/above/more than $X`, `between $X and $Y`, `$X-$Y` |
//! | date   | `today`, `yesterday`, `this/last week\|month\|year`, `last N days\|weeks\|months`, `since/after/before YYYY-MM-DD`, `in YYYY` |
//!
//! Rules are re-applied until the text stops changing, so parsing the
//! residual again extracts nothing and yields the same residual. Plain
//! words such as "recipe" are never treated as type hints.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use synapse_core::{ContentType, QueryFilters};

type Rule = fn(&Captures<'_>, &mut QueryFilters, DateTime<Utc>);

// Order matters within a pass: ranges before single bounds, `last N days`
// before `last week`.
static RULES: Lazy<Vec<(Regex, Rule)>> = Lazy::new(|| {
    let rules: Vec<(&str, Rule)> = vec![
        (r"(?i)\btags?:\s*([\w-]+(?:\s*,\s*[\w-]+)*)", apply_tags),
        (r"(?:^|\s)#([A-Za-z][\w-]*)", apply_tags),
        (r"(?i)\btype:\s*(\w+)", apply_type),
        (r#"(?i)\bauthor:\s*"([^"]+)""#, apply_author),
        (r"(?i)\bauthor:\s*([^\s\x22]+)", apply_author),
        (r"\b[Bb]y\s+([A-Z][\w'.-]*(?:\s+[A-Z][\w'.-]*)*)", apply_author),
        (
            r"(?i)\bbetween\s+\$(\d+(?:\.\d+)?)\s+and\s+\$?(\d+(?:\.\d+)?)",
            apply_price_range,
        ),
        (r"\$(\d+(?:\.\d+)?)\s*-\s*\$?(\d+(?:\.\d+)?)", apply_price_range),
        (
            r"(?i)\b(?:under|below|less\s+than)\s+\$(\d+(?:\.\d+)?)",
            apply_price_max,
        ),
        (
            r"(?i)\b(?:over|above|more\s+than)\s+\$(\d+(?:\.\d+)?)",
            apply_price_min,
        ),
        (r"(?i)\blast\s+(\d+)\s+(days?|weeks?|months?)\b", apply_last_n),
        (r"(?i)\b(?:this|last)\s+(week|month|year)\b", apply_named_period),
        (r"(?i)\b(today|yesterday)\b", apply_day),
        (
            r"(?i)\b(since|after|before)\s+(\d{4}-\d{2}-\d{2})\b",
            apply_bounded_date,
        ),
        (r"(?i)\bin\s+(\d{4})\b", apply_year),
    ];
    rules
        .into_iter()
        .map(|(pattern, rule)| (Regex::new(pattern).expect("query rule pattern is valid"), rule))
        .collect()
});

/// Relative periods never reach further back than this many days.
const MAX_LOOKBACK_DAYS: i64 = 36_500;

/// Parse a raw query relative to the current time.
pub fn parse_query(raw: &str) -> QueryFilters {
    parse_query_at(raw, Utc::now())
}

/// Parse a raw query, resolving relative dates against `now`.
pub fn parse_query_at(raw: &str, now: DateTime<Utc>) -> QueryFilters {
    let mut filters = QueryFilters::default();
    let mut text = normalize_whitespace(raw);

    loop {
        let next = normalize_whitespace(&apply_rules(&text, &mut filters, now));
        if next == text {
            break;
        }
        text = next;
    }

    filters.search_terms = text;
    filters
}

fn apply_rules(text: &str, filters: &mut QueryFilters, now: DateTime<Utc>) -> String {
    let mut text = text.to_string();
    for (re, rule) in RULES.iter() {
        if !re.is_match(&text) {
            continue;
        }
        for caps in re.captures_iter(&text) {
            rule(&caps, filters, now);
        }
        text = re.replace_all(&text, " ").into_owned();
    }
    text
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// =============================================================================
// RULES
// =============================================================================

fn apply_tags(caps: &Captures<'_>, filters: &mut QueryFilters, _now: DateTime<Utc>) {
    let Some(list) = caps.get(1) else { return };
    for tag in list.as_str().split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !filters.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            filters.tags.push(tag.to_string());
        }
    }
}

fn apply_type(caps: &Captures<'_>, filters: &mut QueryFilters, _now: DateTime<Utc>) {
    if let Some(content_type) = caps.get(1).and_then(|m| m.as_str().parse::<ContentType>().ok()) {
        filters.content_type = Some(content_type);
    }
}

fn apply_author(caps: &Captures<'_>, filters: &mut QueryFilters, _now: DateTime<Utc>) {
    if let Some(author) = caps.get(1).map(|m| m.as_str().trim()).filter(|a| !a.is_empty()) {
        filters.author = Some(author.to_string());
    }
}

fn apply_price_range(caps: &Captures<'_>, filters: &mut QueryFilters, _now: DateTime<Utc>) {
    if let (Some(a), Some(b)) = (capture_f64(caps, 1), capture_f64(caps, 2)) {
        filters.price_min = Some(a.min(b));
        filters.price_max = Some(a.max(b));
    }
}

fn apply_price_max(caps: &Captures<'_>, filters: &mut QueryFilters, _now: DateTime<Utc>) {
    if let Some(max) = capture_f64(caps, 1) {
        filters.price_max = Some(max);
    }
}

fn apply_price_min(caps: &Captures<'_>, filters: &mut QueryFilters, _now: DateTime<Utc>) {
    if let Some(min) = capture_f64(caps, 1) {
        filters.price_min = Some(min);
    }
}

fn apply_last_n(caps: &Captures<'_>, filters: &mut QueryFilters, now: DateTime<Utc>) {
    let Some(n) = caps.get(1).and_then(|m| m.as_str().parse::<i64>().ok()) else {
        return;
    };
    let unit = caps.get(2).map(|m| m.as_str().to_lowercase()).unwrap_or_default();
    let days = match unit.trim_end_matches('s') {
        "day" => n,
        "week" => n.saturating_mul(7),
        _ => n.saturating_mul(30),
    };
    narrow_from(filters, now - Duration::days(days.min(MAX_LOOKBACK_DAYS)));
}

fn apply_named_period(caps: &Captures<'_>, filters: &mut QueryFilters, now: DateTime<Utc>) {
    let days = match caps.get(1).map(|m| m.as_str().to_lowercase()).as_deref() {
        Some("week") => 7,
        Some("month") => 30,
        _ => 365,
    };
    narrow_from(filters, now - Duration::days(days));
}

fn apply_day(caps: &Captures<'_>, filters: &mut QueryFilters, now: DateTime<Utc>) {
    let today = now.date_naive();
    let Some(today_start) = start_of_day(today) else { return };
    if caps.get(1).map(|m| m.as_str().eq_ignore_ascii_case("today")) == Some(true) {
        narrow_from(filters, today_start);
    } else {
        narrow_from(filters, today_start - Duration::days(1));
        narrow_to(filters, today_start - Duration::microseconds(1));
    }
}

fn apply_bounded_date(caps: &Captures<'_>, filters: &mut QueryFilters, _now: DateTime<Utc>) {
    let Some(date) = caps
        .get(2)
        .and_then(|m| NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok())
    else {
        return;
    };
    let Some(day_start) = start_of_day(date) else { return };
    match caps.get(1).map(|m| m.as_str().to_lowercase()).as_deref() {
        Some("since") => narrow_from(filters, day_start),
        Some("after") => narrow_from(filters, day_start + Duration::days(1)),
        _ => narrow_to(filters, day_start - Duration::microseconds(1)),
    }
}

fn apply_year(caps: &Captures<'_>, filters: &mut QueryFilters, _now: DateTime<Utc>) {
    let Some(year) = caps.get(1).and_then(|m| m.as_str().parse::<i32>().ok()) else {
        return;
    };
    let start = NaiveDate::from_ymd_opt(year, 1, 1).and_then(start_of_day);
    let next = NaiveDate::from_ymd_opt(year + 1, 1, 1).and_then(start_of_day);
    if let (Some(start), Some(next)) = (start, next) {
        narrow_from(filters, start);
        narrow_to(filters, next - Duration::microseconds(1));
    }
}

fn capture_f64(caps: &Captures<'_>, group: usize) -> Option<f64> {
    caps.get(group)?.as_str().parse::<f64>().ok()
}

fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt))
}

/// Tighten the lower bound; several date phrases intersect.
fn narrow_from(filters: &mut QueryFilters, from: DateTime<Utc>) {
    filters.date_from = Some(filters.date_from.map_or(from, |f| f.max(from)));
}

fn narrow_to(filters: &mut QueryFilters, to: DateTime<Utc>) {
    filters.date_to = Some(filters.date_to.map_or(to, |t| t.min(to)));
}
