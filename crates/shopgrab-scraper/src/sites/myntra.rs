//! Myntra product API (JSON), addressed by numeric style id.
//!
//! The primary schema lives under a top-level `style` object. When that is
//! absent the extractor falls back to `data.style`, then to any object one
//! level down (at the top level or under `data`) that carries an `id`.

use std::collections::BTreeMap;

use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION, ORIGIN, REFERER,
};
use reqwest::Url;
use serde_json::Value;
use shopgrab_core::{collect_images, ProductRecord, Region, SiteKind, SizeOption};

use super::json::{as_bool, as_f64, as_string, as_u64, at, at_keys, items, Step};
use super::{join_path, parse_base_url, Extractor, Site};
use crate::error::ScraperError;
use crate::payload::{PayloadKind, RawPayload};

const DEFAULT_BASE: &str = "https://www.myntra.com";

/// Placeholder tokens in album image URLs and their substitutions.
const IMAGE_PLACEHOLDERS: [(&str, &str); 3] = [
    ("($height)", "1080"),
    ("($qualityPercentage)", "90"),
    ("($width)", "720"),
];

/// `productDetails` titles recorded as specifications, with their keys.
const DETAIL_SPECS: [(&str, &str); 2] = [
    ("MATERIAL & CARE", "Material & Care"),
    ("SIZE & FIT", "Size & Fit"),
];

#[derive(Debug, Clone)]
pub struct MyntraSite {
    base: String,
}

impl Default for MyntraSite {
    fn default() -> Self {
        Self::new()
    }
}

impl MyntraSite {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE)
    }

    #[must_use]
    pub fn with_base_url(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

/// Validates a Myntra style id: one or more ASCII digits.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidIdentifier`] otherwise.
pub fn validate_style_id(id: &str) -> Result<&str, ScraperError> {
    let id = id.trim();
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        Ok(id)
    } else {
        Err(ScraperError::InvalidIdentifier {
            site: SiteKind::Myntra,
            id: id.to_owned(),
            expected: "a numeric style id",
        })
    }
}

fn fill_placeholders(url: &str) -> String {
    IMAGE_PLACEHOLDERS
        .iter()
        .fold(url.to_owned(), |acc, &(token, value)| acc.replace(token, value))
}

/// `secureSrc` of every image in the matching albums, placeholders filled.
fn album_images(style: &Value, default_only: bool) -> Vec<String> {
    let urls = items(at_keys(style, &["media", "albums"]))
        .iter()
        .filter(|album| {
            !default_only || album.get("name").and_then(Value::as_str) == Some("default")
        })
        .flat_map(|album| items(album.get("images")))
        .filter_map(|image| image.get("secureSrc").and_then(Value::as_str))
        .map(fill_placeholders);
    collect_images(None, urls)
}

/// An `id` usable as a product id: a non-empty string, number or bool.
fn has_id(value: &Value) -> bool {
    as_string(value.get("id")).is_some()
}

/// Selling price after the first listed discount, truncated to whole units.
fn discounted_price(mrp: Option<f64>, style: &Value) -> Option<f64> {
    let pct = as_f64(at(
        style,
        &[Step::Key("discounts"), Step::Index(0), Step::Key("discountPercent")],
    ));
    match (mrp, pct) {
        (Some(mrp), Some(pct)) => Some((mrp * (1.0 - pct / 100.0)).trunc()),
        _ => as_f64(at_keys(style, &["price", "discounted"])),
    }
}

fn specifications(style: &Value) -> BTreeMap<String, String> {
    let mut specs = BTreeMap::new();
    let fields = [
        ("Colour", style.get("baseColour")),
        (
            "Gender",
            at_keys(style, &["analytics", "gender"]).or_else(|| style.get("gender")),
        ),
        ("Country of Origin", style.get("countryOfOrigin")),
        ("Manufacturer", style.get("manufacturer")),
    ];
    for (key, value) in fields {
        if let Some(value) = as_string(value) {
            specs.insert(key.to_owned(), value);
        }
    }
    for detail in items(style.get("productDetails")) {
        let title = detail.get("title").and_then(Value::as_str);
        let Some((_, key)) = DETAIL_SPECS.iter().find(|(t, _)| Some(*t) == title) else {
            continue;
        };
        if let Some(description) = as_string(detail.get("description")) {
            specs.insert((*key).to_owned(), description);
        }
    }
    specs
}

fn product_details(style: &Value) -> Option<String> {
    items(style.get("productDetails"))
        .iter()
        .find(|d| d.get("title").and_then(Value::as_str) == Some("Product Details"))
        .and_then(|d| as_string(d.get("description")))
}

fn sizes(style: &Value) -> Vec<SizeOption> {
    items(style.get("sizes"))
        .iter()
        .filter_map(|size| {
            Some(SizeOption {
                label: as_string(size.get("label"))?,
                available: as_bool(size.get("available")).unwrap_or(false),
                sku_id: as_string(size.get("skuId")),
            })
        })
        .collect()
}

fn extract_style(style: &Value, final_url: &str) -> Option<ProductRecord> {
    let id = as_string(style.get("id"))?;
    let mut record = ProductRecord::new(id, SiteKind::Myntra);
    record.url = Some(final_url.to_owned());
    record.name = as_string(style.get("name"));
    record.brand = as_string(at_keys(style, &["brand", "name"]));
    record.mrp = as_f64(style.get("mrp"));
    record.selling_price = discounted_price(record.mrp, style);
    record.categories = ["masterCategory", "subCategory", "articleType"]
        .into_iter()
        .filter_map(|key| as_string(at_keys(style, &["analytics", key])))
        .collect();
    record.specifications = specifications(style);
    record.description = product_details(style);
    record.sizes = sizes(style);
    if !record.sizes.is_empty() {
        record.in_stock = Some(record.sizes.iter().any(|s| s.available));
    }
    record.average_rating = as_f64(at_keys(style, &["ratings", "averageRating"]));
    record.rating_count = as_u64(at_keys(style, &["ratings", "totalCount"]));
    record.images = album_images(style, true);
    Some(record.finalize())
}

/// First object that looks like a product when `style` is missing.
fn fallback_candidate(root: &Value) -> Option<&Value> {
    if let Some(style) = at_keys(root, &["data", "style"]).filter(|v| has_id(v)) {
        return Some(style);
    }
    child_with_id(root).or_else(|| root.get("data").and_then(child_with_id))
}

fn child_with_id(parent: &Value) -> Option<&Value> {
    parent
        .as_object()?
        .values()
        .find(|child| child.is_object() && has_id(child))
}

fn extract_fallback(root: &Value, final_url: &str) -> Option<ProductRecord> {
    let candidate = fallback_candidate(root)?;
    let id = as_string(candidate.get("id"))?;
    let mut record = ProductRecord::new(id, SiteKind::Myntra);
    record.url = Some(final_url.to_owned());
    record.name = as_string(candidate.get("name"));
    record.brand = as_string(at_keys(candidate, &["brand", "name"]));
    record.mrp = as_f64(at_keys(candidate, &["price", "mrp"]))
        .or_else(|| as_f64(candidate.get("mrp")));
    record.selling_price = as_f64(at_keys(candidate, &["price", "discounted"]));
    record.images = album_images(candidate, false);
    record.is_fallback = true;
    Some(record.finalize())
}

fn extract_document(root: &Value, final_url: &str) -> Option<ProductRecord> {
    match root.get("style").filter(|style| has_id(style)) {
        Some(style) => extract_style(style, final_url),
        None => extract_fallback(root, final_url),
    }
}

impl Extractor for MyntraSite {
    fn extract(&self, payload: RawPayload) -> Option<ProductRecord> {
        match payload {
            RawPayload::Json { value, final_url } => extract_document(&value, &final_url),
            RawPayload::Html { .. } => None,
        }
    }
}

impl Site for MyntraSite {
    fn kind(&self) -> SiteKind {
        SiteKind::Myntra
    }

    fn payload_kind(&self) -> PayloadKind {
        PayloadKind::Json
    }

    fn homepage(&self, _region: Region) -> Result<Url, ScraperError> {
        parse_base_url(&self.base)
    }

    fn resolve_url(&self, resource_id: &str, _region: Region) -> Result<Url, ScraperError> {
        let id = validate_style_id(resource_id)?;
        join_path(&self.base, &format!("gateway/v2/product/{id}"))
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(REFERER, HeaderValue::from_static("https://www.myntra.com/"));
        headers.insert(ORIGIN, HeaderValue::from_static("https://www.myntra.com"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
        headers.insert("DNT", HeaderValue::from_static("1"));
        headers
    }
}

#[cfg(test)]
#[path = "myntra_test.rs"]
mod tests;
