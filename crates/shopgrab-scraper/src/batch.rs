//! Sequential batch driver.
//!
//! Items run strictly one after another so pacing stays human-like. A
//! per-item failure is recorded and the batch moves on; cancellation is
//! checked between items only, never inside a retry loop.

use std::sync::atomic::{AtomicBool, Ordering};

use shopgrab_core::{ProductRecord, Region};

use crate::client::SiteClient;
use crate::error::ScraperError;
use crate::payload::FetchRequest;
use crate::transport::Transport;

/// Result of one processed identifier. Exactly one of `record` and
/// `failure` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemOutcome {
    pub resource_id: String,
    pub record: Option<ProductRecord>,
    pub failure: Option<String>,
}

impl ItemOutcome {
    fn success(resource_id: &str, record: ProductRecord) -> Self {
        Self {
            resource_id: resource_id.to_owned(),
            record: Some(record),
            failure: None,
        }
    }

    fn failed(resource_id: &str, reason: String) -> Self {
        Self {
            resource_id: resource_id.to_owned(),
            record: None,
            failure: Some(reason),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.record.is_some()
    }
}

fn failure_reason(err: &ScraperError) -> String {
    match err {
        ScraperError::InvalidIdentifier { .. } => format!("invalid identifier: {err}"),
        ScraperError::Exhausted {
            attempts,
            last_error,
            ..
        } => format!("fetch exhausted: {last_error} after {attempts} attempts"),
        ScraperError::ExtractionFailure { .. } => "extraction failed".to_string(),
        other => other.to_string(),
    }
}

/// Fetches and extracts every id in order, stopping early if `cancel` is
/// set between items.
///
/// Returns one outcome per id that was processed; ids skipped after a
/// cancellation have no outcome.
pub async fn run_batch<T: Transport>(
    client: &mut SiteClient<T>,
    ids: &[String],
    region: Option<Region>,
    cancel: &AtomicBool,
) -> Vec<ItemOutcome> {
    let site = client.kind();
    let mut outcomes = Vec::with_capacity(ids.len());

    for (index, id) in ids.iter().enumerate() {
        if cancel.load(Ordering::SeqCst) {
            tracing::info!(
                site = %site,
                processed = index,
                remaining = ids.len() - index,
                "batch cancelled"
            );
            break;
        }

        let request = FetchRequest::new(id.as_str()).with_region(region);
        let outcome = match client.scrape(&request).await {
            Ok(record) => ItemOutcome::success(id, record),
            Err(e) => ItemOutcome::failed(id, failure_reason(&e)),
        };
        if let Some(reason) = &outcome.failure {
            tracing::error!(site = %site, resource_id = %id, reason = %reason, "item failed");
        }
        outcomes.push(outcome);
    }

    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    tracing::info!(
        site = %site,
        succeeded,
        failed = outcomes.len() - succeeded,
        "batch finished"
    );
    outcomes
}
