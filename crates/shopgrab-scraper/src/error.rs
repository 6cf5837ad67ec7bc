use shopgrab_core::SiteKind;
use thiserror::Error;

use crate::transport::CaptchaChallenge;

/// Outcome of a single request attempt that did not yield a payload.
///
/// Every variant is transient from the retry controller's point of view;
/// [`TransportError::Captcha`] additionally gives a configured solver the
/// chance to clear the challenge first.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("unexpected HTTP status {status}")]
    Http { status: u16 },

    #[error("proxy {proxy} failed: {reason}")]
    Proxy { proxy: String, reason: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("CAPTCHA challenge served")]
    Captcha(CaptchaChallenge),

    #[error("could not decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("invalid {site} identifier \"{id}\": expected {expected}")]
    InvalidIdentifier {
        site: SiteKind,
        id: String,
        expected: &'static str,
    },

    #[error("invalid base URL \"{base}\": {reason}")]
    InvalidBaseUrl { base: String, reason: String },

    #[error("fetch exhausted after {attempts} attempts for {url}: {last_error}")]
    Exhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("extraction failed for {site}: {reason}")]
    ExtractionFailure { site: SiteKind, reason: String },

    #[error("invalid proxy \"{proxy}\": {reason}")]
    InvalidProxy { proxy: String, reason: String },

    #[error("HTTP client error: {0}")]
    ClientBuild(#[from] reqwest::Error),
}
