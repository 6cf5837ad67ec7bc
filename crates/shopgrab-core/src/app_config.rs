use std::path::PathBuf;

use crate::sites::Region;

/// Immutable scraper settings, built once at startup and handed to each
/// site client at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ScraperConfig {
    pub log_level: String,
    pub request_timeout_secs: u64,
    /// Total attempts per logical fetch, including the first.
    pub max_retries: u32,
    /// Base of the `base^attempt` backoff, in seconds.
    pub backoff_base_secs: f64,
    /// Upper bound of the uniform jitter added to each backoff, in seconds.
    pub backoff_jitter_secs: f64,
    /// Lower bound of the pre-attempt pacing delay.
    pub pacing_min_ms: u64,
    /// Upper bound of the pre-attempt pacing delay.
    pub pacing_max_ms: u64,
    pub use_proxies: bool,
    pub proxy_file: PathBuf,
    pub region: Region,
    /// Synthesize user agents with randomized browser versions instead of
    /// drawing only from the fixed pool.
    pub randomize_user_agent: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            request_timeout_secs: 20,
            max_retries: 5,
            backoff_base_secs: 2.0,
            backoff_jitter_secs: 1.0,
            pacing_min_ms: 1_000,
            pacing_max_ms: 3_000,
            use_proxies: false,
            proxy_file: PathBuf::from("proxies.txt"),
            region: Region::Us,
            randomize_user_agent: true,
        }
    }
}

impl ScraperConfig {
    /// Same settings with every pacing and backoff delay set to zero.
    #[must_use]
    pub fn without_delays(mut self) -> Self {
        self.backoff_base_secs = 0.0;
        self.backoff_jitter_secs = 0.0;
        self.pacing_min_ms = 0;
        self.pacing_max_ms = 0;
        self
    }
}
