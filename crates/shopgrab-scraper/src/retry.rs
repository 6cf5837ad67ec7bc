//! Bounded retry controller shared by every site client.
//!
//! One logical fetch runs as an explicit loop: pick an identity, pace,
//! attempt, and on failure back off by `base^attempt` seconds plus jitter.
//! Proxy failures and unsolved CAPTCHAs mark the attempt's proxy failed.
//! Exhaustion is returned as [`ScraperError::Exhausted`], never panics.

use std::time::Duration;

use rand::Rng;
use reqwest::Url;
use shopgrab_core::ScraperConfig;

use crate::error::{ScraperError, TransportError};
use crate::identity::{Identity, IdentitySelector};
use crate::payload::RawPayload;
use crate::transport::{CaptchaChallenge, CaptchaSolver, Transport};

/// Ceiling for a single backoff sleep.
const MAX_BACKOFF_SECS: f64 = 600.0;

/// Delay schedule for one site client.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per fetch, including the first. Never below 1.
    pub max_attempts: u32,
    pub backoff_base_secs: f64,
    pub backoff_jitter_secs: f64,
    pub pacing_min: Duration,
    pub pacing_max: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            backoff_base_secs: config.backoff_base_secs,
            backoff_jitter_secs: config.backoff_jitter_secs,
            pacing_min: Duration::from_millis(config.pacing_min_ms),
            pacing_max: Duration::from_millis(config.pacing_max_ms),
        }
    }

    /// Sleep before attempt number `attempt` (1-based retries):
    /// `base^attempt + uniform(0, jitter)` seconds.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.backoff_base_secs.powi(exponent) + uniform(0.0, self.backoff_jitter_secs);
        secs_to_duration(secs)
    }

    /// Human-like pause taken before every attempt, first one included.
    #[must_use]
    pub fn pacing_delay(&self) -> Duration {
        let secs = uniform(
            self.pacing_min.as_secs_f64(),
            self.pacing_max.as_secs_f64(),
        );
        secs_to_duration(secs)
    }
}

fn uniform(low: f64, high: f64) -> f64 {
    if high <= low {
        return low.max(0.0);
    }
    rand::rng().random_range(low..high)
}

fn secs_to_duration(secs: f64) -> Duration {
    if !secs.is_finite() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(secs.min(MAX_BACKOFF_SECS))
}

/// Accumulated state of one logical fetch. Dropped when the fetch returns.
#[derive(Debug, Default)]
pub(crate) struct RetryState {
    pub(crate) attempt_count: u32,
    pub(crate) last_error: Option<TransportError>,
}

/// Everything the controller borrows from a site client for one fetch.
pub(crate) struct RetryContext<'a, T> {
    pub(crate) transport: &'a T,
    pub(crate) identities: &'a mut IdentitySelector,
    pub(crate) solver: Option<&'a dyn CaptchaSolver>,
    pub(crate) policy: &'a RetryPolicy,
    pub(crate) timeout: Duration,
}

/// Runs attempts against `url` until one succeeds or the policy's attempt
/// budget is spent.
///
/// # Errors
///
/// Returns [`ScraperError::Exhausted`] carrying the attempt count and the
/// last transport error.
pub(crate) async fn fetch_with_retry<T: Transport>(
    ctx: RetryContext<'_, T>,
    url: &Url,
) -> Result<RawPayload, ScraperError> {
    let RetryContext {
        transport,
        identities,
        solver,
        policy,
        timeout,
    } = ctx;
    let mut state = RetryState::default();

    while state.attempt_count < policy.max_attempts {
        let identity = identities.select();
        tokio::time::sleep(policy.pacing_delay()).await;
        state.attempt_count += 1;
        tracing::debug!(
            attempt = state.attempt_count,
            url = %url,
            proxy = identity.proxy.as_deref().unwrap_or("direct"),
            "sending request"
        );

        let err = match attempt_once(transport, solver, url, &identity, timeout).await {
            Ok(payload) => {
                tracing::info!(
                    attempt = state.attempt_count,
                    url = %url,
                    "fetch succeeded"
                );
                return Ok(payload);
            }
            Err(err) => err,
        };

        if matches!(
            err,
            TransportError::Proxy { .. } | TransportError::Captcha(_)
        ) {
            identities.mark_failed(&identity);
        }

        if state.attempt_count < policy.max_attempts {
            let delay = policy.backoff_delay(state.attempt_count);
            tracing::warn!(
                attempt = state.attempt_count,
                max_retries = policy.max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                proxy = identity.proxy.as_deref().unwrap_or("direct"),
                "retryable fetch failure, backing off"
            );
            tokio::time::sleep(delay).await;
        }
        state.last_error = Some(err);
    }

    let last_error = state
        .last_error
        .map_or_else(|| "no attempt made".to_string(), |e| e.to_string());
    tracing::info!(
        attempts = state.attempt_count,
        url = %url,
        error = %last_error,
        "fetch exhausted"
    );
    Err(ScraperError::Exhausted {
        url: url.to_string(),
        attempts: state.attempt_count,
        last_error,
    })
}

/// One attempt. A CAPTCHA is handed to the solver when one is configured;
/// after a successful submission the GET is repeated once with the same
/// identity.
async fn attempt_once<T: Transport>(
    transport: &T,
    solver: Option<&dyn CaptchaSolver>,
    url: &Url,
    identity: &Identity,
    timeout: Duration,
) -> Result<RawPayload, TransportError> {
    match transport.send(url, identity, timeout).await {
        Err(TransportError::Captcha(challenge)) => match solver {
            Some(solver) => {
                if solve_challenge(transport, solver, &challenge, identity, timeout).await {
                    transport.send(url, identity, timeout).await
                } else {
                    Err(TransportError::Captcha(challenge))
                }
            }
            None => Err(TransportError::Captcha(challenge)),
        },
        other => other,
    }
}

async fn solve_challenge<T: Transport>(
    transport: &T,
    solver: &dyn CaptchaSolver,
    challenge: &CaptchaChallenge,
    identity: &Identity,
    timeout: Duration,
) -> bool {
    let Some(image_url) = challenge.image_url.as_deref() else {
        tracing::debug!("challenge has no image; cannot solve");
        return false;
    };
    let Some(solution) = solver.solve(image_url).await else {
        tracing::debug!(image_url, "solver returned no solution");
        return false;
    };
    match transport
        .submit_captcha(challenge, &solution, identity, timeout)
        .await
    {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "CAPTCHA submission failed");
            false
        }
    }
}

#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;
