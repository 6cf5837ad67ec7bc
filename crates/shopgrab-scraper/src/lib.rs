//! Fetching and extraction engine for Amazon, Flipkart, and Myntra product
//! pages.
//!
//! A [`SiteClient`] resolves product URLs, rotates identities and proxies,
//! and drives a bounded retry loop over a [`Transport`]. Site extractors
//! turn the raw payload into a [`shopgrab_core::ProductRecord`].

pub mod batch;
pub mod client;
pub mod error;
pub mod identity;
pub mod payload;
pub mod proxy;
pub mod retry;
pub mod sites;
pub mod transport;

#[cfg(test)]
mod testing;

pub use batch::{run_batch, ItemOutcome};
pub use client::SiteClient;
pub use error::{ScraperError, TransportError};
pub use identity::{Identity, IdentitySelector, UserAgentPool};
pub use payload::{FetchRequest, PayloadKind, RawPayload};
pub use proxy::ProxyPool;
pub use retry::RetryPolicy;
pub use sites::{site_for, AmazonSite, Extractor, FlipkartSite, MyntraSite, Site};
pub use transport::{CaptchaChallenge, CaptchaSolver, HttpTransport, Transport};
