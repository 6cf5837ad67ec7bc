//! `scrape` command handler.
//!
//! Builds one site client from the environment config plus CLI overrides,
//! runs the sequential batch, prints a summary, and exports the records.
//! Per-item failures are reported, never propagated.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Args;
use shopgrab_core::{ProductRecord, Region, ScraperConfig, SiteKind};
use shopgrab_scraper::{run_batch, ItemOutcome, SiteClient};

use crate::export::{default_stem, write_records, ExportFormat};

#[derive(Debug, Args)]
pub(crate) struct ScrapeArgs {
    /// Site to scrape (amazon, flipkart, myntra)
    #[arg(long)]
    pub(crate) site: SiteKind,
    /// Region code for region-aware sites (us, in, uk, ca, de, jp)
    #[arg(long)]
    pub(crate) region: Option<Region>,
    /// File with one product id per line
    #[arg(long)]
    pub(crate) ids_file: Option<PathBuf>,
    /// Export format
    #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
    pub(crate) format: ExportFormat,
    /// Output path without extension; defaults to a timestamped name
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Rotate through the proxies in the proxy file
    #[arg(long)]
    pub(crate) use_proxies: bool,
    /// Proxy list, one `scheme://host:port` per line
    #[arg(long)]
    pub(crate) proxy_file: Option<PathBuf>,
    /// Skip the homepage visit that seeds session cookies
    #[arg(long)]
    pub(crate) no_warm_up: bool,
    /// Product ids (ASIN, Flipkart id, or Myntra style id)
    pub(crate) ids: Vec<String>,
}

/// Ids from the command line followed by those in `ids_file`. Blank lines
/// and `#` comments in the file are skipped.
///
/// # Errors
///
/// Returns an error if `ids_file` cannot be read.
pub(crate) fn collect_ids(
    cli_ids: &[String],
    ids_file: Option<&Path>,
) -> anyhow::Result<Vec<String>> {
    let mut ids: Vec<String> = cli_ids
        .iter()
        .map(|id| id.trim().to_owned())
        .filter(|id| !id.is_empty())
        .collect();
    if let Some(path) = ids_file {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read ids file {}: {e}", path.display()))?;
        ids.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_owned),
        );
    }
    Ok(ids)
}

/// Applies CLI overrides on top of the environment config.
pub(crate) fn apply_overrides(mut config: ScraperConfig, args: &ScrapeArgs) -> ScraperConfig {
    if args.use_proxies {
        config.use_proxies = true;
    }
    if let Some(path) = &args.proxy_file {
        config.proxy_file.clone_from(path);
    }
    if let Some(region) = args.region {
        config.region = region;
    }
    config
}

fn print_summary(site: SiteKind, outcomes: &[ItemOutcome], requested: usize) {
    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    println!(
        "{site}: {succeeded} succeeded, {} failed, {} skipped",
        outcomes.len() - succeeded,
        requested - outcomes.len()
    );
    for outcome in outcomes {
        if let Some(reason) = &outcome.failure {
            println!("  {}: {reason}", outcome.resource_id);
        }
    }
}

/// Runs the `scrape` command.
///
/// # Errors
///
/// Returns an error if no ids were given, the ids or proxy file cannot be
/// read, the client cannot be built, or an export file cannot be written.
pub(crate) async fn run_scrape(config: ScraperConfig, args: ScrapeArgs) -> anyhow::Result<()> {
    let config = apply_overrides(config, &args);
    let ids = collect_ids(&args.ids, args.ids_file.as_deref())?;
    if ids.is_empty() {
        anyhow::bail!("no product ids given; pass ids as arguments or use --ids-file");
    }

    let proxies = shopgrab_core::resolve_proxies(&config)?;
    let mut client = SiteClient::for_site(args.site, &config, proxies)
        .map_err(|e| anyhow::anyhow!("failed to build {} client: {e}", args.site))?;

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; stopping after the current item");
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    if !args.no_warm_up {
        client.warm_up().await;
    }

    tracing::info!(site = %args.site, region = %config.region, items = ids.len(), "scrape started");
    let outcomes = run_batch(&mut client, &ids, Some(config.region), &cancel).await;
    print_summary(args.site, &outcomes, ids.len());

    let records: Vec<ProductRecord> = outcomes.into_iter().filter_map(|o| o.record).collect();
    if records.is_empty() {
        println!("no products extracted; nothing exported");
        return Ok(());
    }

    let stem = args.output.unwrap_or_else(|| {
        PathBuf::from(default_stem(
            args.site,
            config.region,
            chrono::Local::now().naive_local(),
        ))
    });
    for path in write_records(&records, &stem, args.format)? {
        println!("wrote {} records to {}", records.len(), path.display());
    }
    Ok(())
}
