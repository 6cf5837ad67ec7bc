//! Per-site client: URL resolution, identity rotation, and the retry loop
//! around one [`Transport`].

mod session;

use std::time::Duration;

use reqwest::Url;
use shopgrab_core::{ProductRecord, Region, ScraperConfig, SiteKind};

use crate::error::ScraperError;
use crate::identity::{Identity, IdentitySelector, UserAgentPool};
use crate::payload::{FetchRequest, RawPayload};
use crate::proxy::ProxyPool;
use crate::retry::{fetch_with_retry, RetryContext, RetryPolicy};
use crate::sites::{site_for, Site};
use crate::transport::{CaptchaSolver, HttpTransport, Transport};

/// Fetches and extracts products from one site.
///
/// A client owns its proxy pool, failed set, and session cookies; it is
/// meant to be driven by one caller, one item at a time.
pub struct SiteClient<T: Transport = HttpTransport> {
    site: Box<dyn Site>,
    transport: T,
    identities: IdentitySelector,
    policy: RetryPolicy,
    timeout: Duration,
    region: Region,
    solver: Option<Box<dyn CaptchaSolver>>,
}

impl SiteClient<HttpTransport> {
    /// Builds a reqwest-backed client for one of the built-in sites.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidProxy`] if a proxy endpoint cannot be
    /// parsed, or [`ScraperError::ClientBuild`] if the HTTP client cannot
    /// be constructed.
    pub fn for_site(
        kind: SiteKind,
        config: &ScraperConfig,
        proxies: Vec<String>,
    ) -> Result<Self, ScraperError> {
        Self::from_site(site_for(kind), config, proxies)
    }

    /// Builds a reqwest-backed client for an arbitrary [`Site`], e.g. one
    /// pointed at a mock server.
    ///
    /// # Errors
    ///
    /// Same as [`SiteClient::for_site`].
    pub fn from_site(
        site: Box<dyn Site>,
        config: &ScraperConfig,
        proxies: Vec<String>,
    ) -> Result<Self, ScraperError> {
        let transport = HttpTransport::new(site.default_headers(), site.payload_kind(), &proxies)?;
        Ok(Self::new(site, transport, config, proxies))
    }
}

impl<T: Transport> SiteClient<T> {
    #[must_use]
    pub fn new(
        site: Box<dyn Site>,
        transport: T,
        config: &ScraperConfig,
        proxies: Vec<String>,
    ) -> Self {
        Self {
            site,
            transport,
            identities: IdentitySelector::new(
                UserAgentPool::new(config.randomize_user_agent),
                ProxyPool::new(proxies),
            ),
            policy: RetryPolicy::from_config(config),
            timeout: Duration::from_secs(config.request_timeout_secs),
            region: config.region,
            solver: None,
        }
    }

    /// Hands CAPTCHA challenges to `solver` before falling back to a retry.
    #[must_use]
    pub fn with_solver(mut self, solver: impl CaptchaSolver + 'static) -> Self {
        self.solver = Some(Box::new(solver));
        self
    }

    /// Replaces the user-agent pool with a fixed list.
    #[must_use]
    pub fn with_user_agents(mut self, agents: Vec<String>) -> Self {
        let proxies = self.identities.proxies().clone();
        self.identities = IdentitySelector::new(UserAgentPool::with_agents(agents), proxies);
        self
    }

    #[must_use]
    pub fn kind(&self) -> SiteKind {
        self.site.kind()
    }

    #[must_use]
    pub fn default_region(&self) -> Region {
        self.region
    }

    #[must_use]
    pub fn proxy_pool(&self) -> &ProxyPool {
        self.identities.proxies()
    }

    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Product URL for `request`, cache-buster included where the site
    /// uses one.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidIdentifier`] if the id does not have
    /// the site's lexical form.
    pub fn resolve_url(&self, request: &FetchRequest) -> Result<Url, ScraperError> {
        let region = request.region.unwrap_or(self.region);
        let url = self.site.resolve_url(&request.resource_id, region)?;
        Ok(session::apply_nonce(
            url,
            request.query_nonce.as_deref(),
            self.site.uses_cache_buster(),
        ))
    }

    /// Rolls the identity for the next attempt.
    pub fn select_identity(&mut self) -> Identity {
        self.identities.select()
    }

    /// Fetches the raw payload for `request` under the retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidIdentifier`] before any request is
    /// made, or [`ScraperError::Exhausted`] once every attempt failed.
    pub async fn try_fetch(&mut self, request: &FetchRequest) -> Result<RawPayload, ScraperError> {
        let url = self.resolve_url(request)?;
        let ctx = RetryContext {
            transport: &self.transport,
            identities: &mut self.identities,
            solver: self.solver.as_deref(),
            policy: &self.policy,
            timeout: self.timeout,
        };
        fetch_with_retry(ctx, &url).await
    }

    /// Fetches `resource_id`, returning `None` on any failure. The failure
    /// is logged, never raised.
    pub async fn fetch(&mut self, resource_id: &str, region: Option<Region>) -> Option<RawPayload> {
        let request = FetchRequest::new(resource_id).with_region(region);
        match self.try_fetch(&request).await {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!(
                    site = %self.kind(),
                    resource_id,
                    error = %e,
                    "fetch failed"
                );
                None
            }
        }
    }

    /// Extracts a record from `payload` with this client's site extractor.
    #[must_use]
    pub fn extract(&self, payload: RawPayload) -> Option<ProductRecord> {
        self.site.extract(payload)
    }

    /// Like [`SiteClient::extract`], but reports an unrecognizable payload
    /// as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::ExtractionFailure`] when the payload is not
    /// the site's format or holds no identifiable product.
    pub fn try_extract(&self, payload: RawPayload) -> Result<ProductRecord, ScraperError> {
        let url = payload.final_url().to_owned();
        if payload.kind() != self.site.payload_kind() {
            return Err(ScraperError::ExtractionFailure {
                site: self.kind(),
                reason: format!(
                    "expected {:?} payload, got {:?} at {url}",
                    self.site.payload_kind(),
                    payload.kind()
                ),
            });
        }
        self.site
            .extract(payload)
            .ok_or_else(|| ScraperError::ExtractionFailure {
                site: self.kind(),
                reason: format!("no product data at {url}"),
            })
    }

    /// Fetch followed by extraction.
    ///
    /// # Errors
    ///
    /// Any error from [`SiteClient::try_fetch`] or
    /// [`SiteClient::try_extract`].
    pub async fn scrape(&mut self, request: &FetchRequest) -> Result<ProductRecord, ScraperError> {
        let payload = self.try_fetch(request).await?;
        self.try_extract(payload)
    }

    /// One paced, non-retried visit to the site's homepage to seed session
    /// cookies. Returns whether it succeeded; failure is only logged.
    pub async fn warm_up(&mut self) -> bool {
        let url = match self.site.homepage(self.region) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(site = %self.kind(), error = %e, "warm-up skipped");
                return false;
            }
        };
        let identity = self.identities.select();
        tokio::time::sleep(self.policy.pacing_delay()).await;
        match self.transport.visit(&url, &identity, self.timeout).await {
            Ok(()) => {
                tracing::info!(site = %self.kind(), url = %url, "session warmed up");
                true
            }
            Err(e) => {
                tracing::warn!(site = %self.kind(), url = %url, error = %e, "warm-up failed");
                false
            }
        }
    }
}
