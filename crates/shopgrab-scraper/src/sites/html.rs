//! Lenient HTML lookups shared by the HTML extractors.
//!
//! Every helper returns `None` on a missing node or unparseable text.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static RATING_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"));

static COUNT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:,\d+)*").expect("valid regex"));

static META_OG_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:title"]"#).expect("valid selector"));

static META_OG_IMAGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:image"]"#).expect("valid selector"));

static META_OG_URL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:url"]"#).expect("valid selector"));

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));

/// Strips every character that is not a digit or `.` and parses the rest.
///
/// `"₹1,299.00"` parses to `1299.0`; `"N/A"` and `"1.2.3"` yield `None`.
#[must_use]
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// First decimal or integer token, e.g. `"4.5 out of 5 stars"` → `4.5`.
#[must_use]
pub fn parse_rating(text: &str) -> Option<f64> {
    RATING_TOKEN
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// First comma-grouped integer, e.g. `"1,234 ratings"` → `1234`.
#[must_use]
pub fn parse_count(text: &str) -> Option<u64> {
    COUNT_TOKEN
        .find(text)
        .and_then(|m| m.as_str().replace(',', "").parse::<u64>().ok())
}

/// Text content of an element with runs of whitespace collapsed.
#[must_use]
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapsed text of the first match, if non-empty.
#[must_use]
pub fn select_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(element_text)
        .find(|t| !t.is_empty())
}

/// Trimmed attribute of the first match carrying it, if non-empty.
#[must_use]
pub fn select_attr(document: &Html, selector: &Selector, attr: &str) -> Option<String> {
    document
        .select(selector)
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_owned)
}

#[must_use]
pub fn og_title(document: &Html) -> Option<String> {
    select_attr(document, &META_OG_TITLE, "content")
}

#[must_use]
pub fn og_image(document: &Html) -> Option<String> {
    select_attr(document, &META_OG_IMAGE, "content")
}

#[must_use]
pub fn og_url(document: &Html) -> Option<String> {
    select_attr(document, &META_OG_URL, "content")
}

#[must_use]
pub fn page_title(document: &Html) -> Option<String> {
    select_text(document, &TITLE)
}
