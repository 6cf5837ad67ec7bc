//! Amazon product pages (HTML), addressed by ASIN.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::HeaderMap;
use reqwest::Url;
use scraper::Html;
use shopgrab_core::{collect_images, ProductRecord, Region, SiteKind};

use super::html::{
    element_text, og_image, og_title, page_title, parse_count, parse_price, parse_rating,
    select_attr, select_text,
};
use super::{join_path, navigation_headers, parse_base_url, Extractor, Site};
use crate::error::ScraperError;
use crate::payload::{PayloadKind, RawPayload};

const DOMAINS: [(Region, &str); 6] = [
    (Region::Us, "amazon.com"),
    (Region::In, "amazon.in"),
    (Region::Uk, "amazon.co.uk"),
    (Region::Ca, "amazon.ca"),
    (Region::De, "amazon.de"),
    (Region::Jp, "amazon.co.jp"),
];

selector!(TITLE, "#productTitle");
selector!(BRAND, "#bylineInfo, .a-link-normal.contributorNameID");
selector!(PRICE, ".a-price:not(.a-text-price) .a-offscreen");
selector!(LIST_PRICE, "span.a-price.a-text-price span.a-offscreen");
selector!(RATING, "#acrPopover");
selector!(RATING_COUNT, "#acrCustomerReviewText");
selector!(AVAILABILITY, "#availability");
selector!(DESCRIPTION, "#productDescription");
selector!(FEATURE_BULLETS, "#feature-bullets li");
selector!(LANDING_IMAGE, "#landingImage");
selector!(ALT_IMAGES, "#altImages img");
selector!(DETAIL_ROWS, ".prodDetTable tr");
selector!(EXPANDER_ROWS, ".a-expander-content table tr");
selector!(ROW_CELLS, "td, th");
selector!(BREADCRUMBS, "#wayfinding-breadcrumbs_feature_div li");
selector!(ASIN_INPUT, "input#ASIN");

static ASIN_IN_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/dp/([A-Z0-9]{10})").expect("valid regex"));

static BRAND_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:Visit the|Brand:|by)\s+").expect("valid regex"));

static BRAND_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+Store$").expect("valid regex"));

static THUMBNAIL_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\._SS\d+_").expect("valid regex"));

/// Amazon storefronts, one domain per [`Region`].
#[derive(Debug, Clone, Default)]
pub struct AmazonSite {
    base_override: Option<String>,
}

impl AmazonSite {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves every region from `base` instead of the public domains.
    #[must_use]
    pub fn with_base_url(base: impl Into<String>) -> Self {
        Self {
            base_override: Some(base.into()),
        }
    }

    fn base_for(&self, region: Region) -> String {
        match &self.base_override {
            Some(base) => base.clone(),
            None => format!("https://www.{}", domain_for(region)),
        }
    }
}

#[must_use]
pub fn domain_for(region: Region) -> &'static str {
    DOMAINS
        .iter()
        .find(|(r, _)| *r == region)
        .map_or("amazon.com", |(_, domain)| *domain)
}

/// Region whose domain serves `url`; `us` when none matches.
#[must_use]
pub fn region_from_url(url: &str) -> Region {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_default();
    DOMAINS
        .iter()
        .find(|(_, domain)| host == *domain || host.ends_with(&format!(".{domain}")))
        .map_or(Region::Us, |(region, _)| *region)
}

/// Validates and normalizes an ASIN: exactly 10 ASCII alphanumerics,
/// returned uppercased.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidIdentifier`] for anything else.
pub fn normalize_asin(id: &str) -> Result<String, ScraperError> {
    let id = id.trim();
    if id.len() == 10 && id.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(id.to_ascii_uppercase())
    } else {
        Err(ScraperError::InvalidIdentifier {
            site: SiteKind::Amazon,
            id: id.to_owned(),
            expected: "10 ASCII alphanumeric characters (ASIN)",
        })
    }
}

fn clean_brand(raw: &str) -> Option<String> {
    let stripped = BRAND_PREFIX.replace(raw.trim(), "");
    let stripped = BRAND_SUFFIX.replace(&stripped, "");
    let brand = stripped.trim();
    (!brand.is_empty()).then(|| brand.to_owned())
}

fn upgrade_thumbnail(url: &str) -> String {
    THUMBNAIL_SIZE.replace_all(url, "._SL1500_").into_owned()
}

fn asin_from(document: &Html, final_url: &str) -> Option<String> {
    ASIN_IN_PATH
        .captures(final_url)
        .map(|c| c[1].to_owned())
        .or_else(|| {
            select_attr(document, &ASIN_INPUT, "value")
                .and_then(|v| normalize_asin(&v).ok())
        })
}

fn landing_image(document: &Html) -> Option<String> {
    let element = document.select(&LANDING_IMAGE).next()?;
    let value = element.value();
    value
        .attr("data-old-hires")
        .filter(|s| !s.trim().is_empty())
        .or_else(|| value.attr("src"))
        .map(str::to_owned)
}

fn specifications(document: &Html) -> BTreeMap<String, String> {
    let mut rows: Vec<_> = document.select(&DETAIL_ROWS).collect();
    if rows.is_empty() {
        rows = document.select(&EXPANDER_ROWS).collect();
    }
    rows.into_iter()
        .filter_map(|row| {
            let mut cells = row.select(&ROW_CELLS).map(element_text);
            let key = cells.next()?;
            let value = cells.next()?;
            (!key.is_empty() && !value.is_empty()).then_some((key, value))
        })
        .collect()
}

fn extract_page(text: &str, final_url: &str) -> Option<ProductRecord> {
    let document = Html::parse_document(text);
    let asin = asin_from(&document, final_url)?;
    let mut record = ProductRecord::new(asin, SiteKind::Amazon);
    record.url = Some(final_url.to_owned());
    record.region = Some(region_from_url(final_url).code().to_owned());

    let Some(name) = select_text(&document, &TITLE) else {
        return extract_fallback(&document, record);
    };
    record.name = Some(name);
    record.brand = select_text(&document, &BRAND).and_then(|b| clean_brand(&b));
    record.selling_price = select_text(&document, &PRICE).and_then(|p| parse_price(&p));
    record.mrp = select_text(&document, &LIST_PRICE).and_then(|p| parse_price(&p));
    record.average_rating =
        select_attr(&document, &RATING, "title").and_then(|t| parse_rating(&t));
    record.rating_count = select_text(&document, &RATING_COUNT).and_then(|t| parse_count(&t));

    if let Some(availability) = select_text(&document, &AVAILABILITY) {
        record.in_stock = Some(availability.to_lowercase().contains("in stock"));
        record.availability = Some(availability);
    }
    record.description = select_text(&document, &DESCRIPTION);
    record.features = document
        .select(&FEATURE_BULLETS)
        .filter(|li| !li.value().classes().any(|c| c == "hide"))
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect();

    let gallery = document
        .select(&ALT_IMAGES)
        .filter_map(|img| img.value().attr("src"))
        .map(upgrade_thumbnail);
    record.images = collect_images(landing_image(&document), gallery);
    record.specifications = specifications(&document);
    record.categories = document
        .select(&BREADCRUMBS)
        .map(element_text)
        .filter(|t| !t.is_empty() && !t.contains('›'))
        .collect();

    Some(record.finalize())
}

/// Reduced page without `#productTitle`: keep whatever Open Graph and
/// price data exist, as long as something besides the ASIN was found.
fn extract_fallback(document: &Html, mut record: ProductRecord) -> Option<ProductRecord> {
    record.name = og_title(document).or_else(|| page_title(document));
    record.selling_price = select_text(document, &PRICE).and_then(|p| parse_price(&p));
    record.images = collect_images(og_image(document), Vec::new());
    if record.name.is_none() && record.selling_price.is_none() && record.images.is_empty() {
        return None;
    }
    record.is_fallback = true;
    Some(record.finalize())
}

impl Extractor for AmazonSite {
    fn extract(&self, payload: RawPayload) -> Option<ProductRecord> {
        match payload {
            RawPayload::Html { text, final_url } => extract_page(&text, &final_url),
            RawPayload::Json { .. } => None,
        }
    }
}

impl Site for AmazonSite {
    fn kind(&self) -> SiteKind {
        SiteKind::Amazon
    }

    fn payload_kind(&self) -> PayloadKind {
        PayloadKind::Html
    }

    fn homepage(&self, region: Region) -> Result<Url, ScraperError> {
        parse_base_url(&self.base_for(region))
    }

    fn resolve_url(&self, resource_id: &str, region: Region) -> Result<Url, ScraperError> {
        let asin = normalize_asin(resource_id)?;
        join_path(&self.base_for(region), &format!("dp/{asin}"))
    }

    fn default_headers(&self) -> HeaderMap {
        navigation_headers()
    }

    fn uses_cache_buster(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "amazon_test.rs"]
mod tests;
