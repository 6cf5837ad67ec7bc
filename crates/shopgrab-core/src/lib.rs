//! Shared model and configuration for the shopgrab scraper.

pub mod app_config;
pub mod config;
pub mod products;
pub mod sites;

use std::path::PathBuf;

use thiserror::Error;

pub use app_config::ScraperConfig;
pub use config::{
    load_proxy_list, load_scraper_config, load_scraper_config_from_env, parse_proxy_list,
    resolve_proxies,
};
pub use products::{collect_images, discount_percent, round2, ProductRecord, SizeOption};
pub use sites::{Region, SiteKind};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read proxy list {}: {source}", path.display())]
    ProxyList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
