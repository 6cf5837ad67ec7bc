//! Flipkart product pages (HTML).

use std::collections::BTreeMap;

use reqwest::header::HeaderMap;
use reqwest::Url;
use scraper::{ElementRef, Html};
use shopgrab_core::{collect_images, ProductRecord, Region, SiteKind};

use super::html::{
    element_text, og_image, og_title, og_url, parse_count, parse_price, parse_rating,
    select_text,
};
use super::{join_path, navigation_headers, parse_base_url, Extractor, Site};
use crate::error::ScraperError;
use crate::payload::{PayloadKind, RawPayload};

const DEFAULT_BASE: &str = "https://www.flipkart.com";

selector!(NAME, "span.B_NuCI");
selector!(BRAND, "span.G6XhRU");
selector!(LIST_PRICE, "div._3I9_wc");
selector!(PRICE, "div._30jeq3");
selector!(RATING, "div._3LWZlK");
selector!(RATING_COUNT, "span._2_R_DZ");
selector!(HIGHLIGHTS, "div._2cM9lP li");
selector!(SPEC_GROUPS, "div._14cfVK");
selector!(SPEC_GROUP_TITLE, "div._2lzn0o");
selector!(SPEC_ROWS, "tr._1s_Smc");
selector!(SPEC_CELLS, "td");
selector!(GALLERY, "div.CXW8mj img");

#[derive(Debug, Clone)]
pub struct FlipkartSite {
    base: String,
}

impl Default for FlipkartSite {
    fn default() -> Self {
        Self::new()
    }
}

impl FlipkartSite {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE)
    }

    #[must_use]
    pub fn with_base_url(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

/// Validates a Flipkart product id: 10 to 20 ASCII alphanumerics.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidIdentifier`] otherwise.
pub fn validate_product_id(id: &str) -> Result<&str, ScraperError> {
    let id = id.trim();
    if (10..=20).contains(&id.len()) && id.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(id)
    } else {
        Err(ScraperError::InvalidIdentifier {
            site: SiteKind::Flipkart,
            id: id.to_owned(),
            expected: "10-20 ASCII alphanumeric characters",
        })
    }
}

/// The `pid` query parameter if present, else the last path segment.
fn product_id_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if let Some((_, pid)) = parsed.query_pairs().find(|(k, _)| k == "pid") {
        if !pid.is_empty() {
            return Some(pid.into_owned());
        }
    }
    parsed
        .path_segments()?
        .rfind(|s| !s.is_empty())
        .map(str::to_owned)
}

fn upgrade_thumbnail(url: &str) -> String {
    url.replace("/128/", "/832/")
}

/// Grouped specification tables, keyed `"{group}: {key}"`.
fn specifications(document: &Html) -> BTreeMap<String, String> {
    let mut specs = BTreeMap::new();
    for group in document.select(&SPEC_GROUPS) {
        let title = group
            .select(&SPEC_GROUP_TITLE)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "General".to_string());
        for row in group.select(&SPEC_ROWS) {
            if let Some((key, value)) = spec_row(row) {
                specs.insert(format!("{title}: {key}"), value);
            }
        }
    }
    specs
}

fn spec_row(row: ElementRef<'_>) -> Option<(String, String)> {
    let mut cells = row.select(&SPEC_CELLS).map(element_text);
    let key = cells.next()?;
    let value = cells.next()?;
    (!key.is_empty() && !value.is_empty()).then_some((key, value))
}

fn extract_page(text: &str, final_url: &str) -> Option<ProductRecord> {
    let document = Html::parse_document(text);

    let Some(name) = select_text(&document, &NAME) else {
        return extract_fallback(&document, final_url);
    };
    let id = product_id_from_url(final_url)?;
    let mut record = ProductRecord::new(id, SiteKind::Flipkart);
    record.url = Some(final_url.to_owned());
    record.name = Some(name);
    record.brand = select_text(&document, &BRAND);
    record.mrp = select_text(&document, &LIST_PRICE).and_then(|p| parse_price(&p));
    record.selling_price = select_text(&document, &PRICE).and_then(|p| parse_price(&p));
    record.average_rating = select_text(&document, &RATING).and_then(|t| parse_rating(&t));
    record.rating_count = select_text(&document, &RATING_COUNT).and_then(|t| parse_count(&t));
    record.features = document
        .select(&HIGHLIGHTS)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect();
    record.specifications = specifications(&document);
    let gallery = document
        .select(&GALLERY)
        .filter_map(|img| img.value().attr("src"))
        .map(upgrade_thumbnail);
    record.images = collect_images(None, gallery);

    Some(record.finalize())
}

/// Page without the product title node: Open Graph tags only.
fn extract_fallback(document: &Html, final_url: &str) -> Option<ProductRecord> {
    let canonical = og_url(document);
    let id = product_id_from_url(final_url)
        .or_else(|| canonical.as_deref().and_then(product_id_from_url))?;
    let mut record = ProductRecord::new(id, SiteKind::Flipkart);
    record.url = Some(final_url.to_owned());
    record.name = og_title(document);
    record.selling_price = select_text(document, &PRICE).and_then(|p| parse_price(&p));
    record.images = collect_images(og_image(document), Vec::new());
    if record.name.is_none() && record.selling_price.is_none() && record.images.is_empty() {
        return None;
    }
    record.is_fallback = true;
    Some(record.finalize())
}

impl Extractor for FlipkartSite {
    fn extract(&self, payload: RawPayload) -> Option<ProductRecord> {
        match payload {
            RawPayload::Html { text, final_url } => extract_page(&text, &final_url),
            RawPayload::Json { .. } => None,
        }
    }
}

impl Site for FlipkartSite {
    fn kind(&self) -> SiteKind {
        SiteKind::Flipkart
    }

    fn payload_kind(&self) -> PayloadKind {
        PayloadKind::Html
    }

    fn homepage(&self, _region: Region) -> Result<Url, ScraperError> {
        parse_base_url(&self.base)
    }

    fn resolve_url(&self, resource_id: &str, _region: Region) -> Result<Url, ScraperError> {
        let id = validate_product_id(resource_id)?;
        join_path(&self.base, &format!("product/{id}"))
    }

    fn default_headers(&self) -> HeaderMap {
        navigation_headers()
    }
}
