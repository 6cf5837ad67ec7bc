mod export;
mod scrape;

use clap::{Parser, Subcommand};
use shopgrab_core::{ConfigError, ScraperConfig};
use tracing_subscriber::EnvFilter;

use crate::scrape::ScrapeArgs;

#[derive(Debug, Parser)]
#[command(name = "shopgrab")]
#[command(about = "Scrape product data from Amazon, Flipkart, and Myntra")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch and extract products by site-specific id
    Scrape(ScrapeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    run(cli, shopgrab_core::load_scraper_config_from_env).await
}

/// Loads the environment config only once a command needs it, so help and
/// usage output never depend on `SHOPGRAB_*` values.
async fn run(
    cli: Cli,
    load_config: impl FnOnce() -> Result<ScraperConfig, ConfigError>,
) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        println!("nothing to do; see `shopgrab scrape --help`");
        return Ok(());
    };

    let config = load_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Scrape(args) => scrape::run_scrape(config, args).await,
    }
}

#[cfg(test)]
mod tests;
