//! Per-site URL resolution, request headers, and extraction.
//!
//! Each supported storefront implements [`Site`]; [`site_for`] picks the
//! implementation for a [`SiteKind`].

/// Declares a lazily parsed, constant CSS selector.
macro_rules! selector {
    ($name:ident, $css:expr) => {
        static $name: std::sync::LazyLock<scraper::Selector> = std::sync::LazyLock::new(|| {
            scraper::Selector::parse($css).expect("valid selector")
        });
    };
}

pub mod amazon;
pub mod flipkart;
pub mod html;
pub mod json;
pub mod myntra;

use reqwest::header::HeaderMap;
use reqwest::Url;
use shopgrab_core::{ProductRecord, Region, SiteKind};

use crate::error::ScraperError;
use crate::payload::{PayloadKind, RawPayload};

pub use amazon::AmazonSite;
pub use flipkart::FlipkartSite;
pub use myntra::MyntraSite;

/// Pure transformation from a fetched payload to a product record.
///
/// Never fails loudly: missing nodes omit fields, and an unrecognizable
/// payload yields `None`.
pub trait Extractor {
    fn extract(&self, payload: RawPayload) -> Option<ProductRecord>;
}

/// A storefront the scraper knows how to address and parse.
pub trait Site: Extractor + Send + Sync {
    fn kind(&self) -> SiteKind;

    fn payload_kind(&self) -> PayloadKind;

    /// Landing page used to seed session cookies.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if the configured base is
    /// not a valid URL.
    fn homepage(&self, region: Region) -> Result<Url, ScraperError>;

    /// Product URL for `resource_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidIdentifier`] when the id does not
    /// have the site's lexical form.
    fn resolve_url(&self, resource_id: &str, region: Region) -> Result<Url, ScraperError>;

    /// Browser-like headers sent with every request to this site.
    fn default_headers(&self) -> HeaderMap;

    /// Whether product URLs get a `_=<unix secs>` cache-buster.
    fn uses_cache_buster(&self) -> bool {
        false
    }
}

#[must_use]
pub fn site_for(kind: SiteKind) -> Box<dyn Site> {
    match kind {
        SiteKind::Amazon => Box::new(AmazonSite::new()),
        SiteKind::Flipkart => Box::new(FlipkartSite::new()),
        SiteKind::Myntra => Box::new(MyntraSite::new()),
    }
}

pub(crate) fn parse_base_url(base: &str) -> Result<Url, ScraperError> {
    Url::parse(base).map_err(|e| ScraperError::InvalidBaseUrl {
        base: base.to_owned(),
        reason: e.to_string(),
    })
}

/// Joins `path` onto `base`, keeping any path prefix the base carries.
pub(crate) fn join_path(base: &str, path: &str) -> Result<Url, ScraperError> {
    let joined = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    parse_base_url(&joined)
}

/// Headers a desktop browser sends when navigating to an HTML page.
pub(crate) fn navigation_headers() -> HeaderMap {
    use reqwest::header::{HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION};

    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("DNT", HeaderValue::from_static("1"));
    headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));
    headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("document"));
    headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("navigate"));
    headers.insert("Sec-Fetch-Site", HeaderValue::from_static("none"));
    headers.insert("Sec-Fetch-User", HeaderValue::from_static("?1"));
    headers
}
