use std::path::{Path, PathBuf};

use crate::app_config::ScraperConfig;
use crate::sites::Region;
use crate::ConfigError;

/// Load scraper configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but its value is invalid.
pub fn load_scraper_config() -> Result<ScraperConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_scraper_config_from_env()
}

/// Load scraper configuration from environment variables already in the process.
///
/// Unlike [`load_scraper_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but its value is invalid.
pub fn load_scraper_config_from_env() -> Result<ScraperConfig, ConfigError> {
    build_scraper_config(|key| std::env::var(key))
}

/// Build scraper configuration using the provided env-var lookup function.
///
/// Every variable is optional; absent variables take the defaults from
/// [`ScraperConfig::default`].
fn build_scraper_config<F>(lookup: F) -> Result<ScraperConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let defaults = ScraperConfig::default();

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: u32| -> Result<u32, ConfigError> {
        lookup(var).map_or(Ok(default), |raw| {
            raw.trim()
                .parse::<u32>()
                .map_err(|e| invalid(var, e.to_string()))
        })
    };

    let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
        lookup(var).map_or(Ok(default), |raw| {
            raw.trim()
                .parse::<u64>()
                .map_err(|e| invalid(var, e.to_string()))
        })
    };

    let parse_secs = |var: &str, default: f64| -> Result<f64, ConfigError> {
        let Ok(raw) = lookup(var) else {
            return Ok(default);
        };
        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(var, format!("must be a non-negative number, got {value}")));
        }
        Ok(value)
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        let Ok(raw) = lookup(var) else {
            return Ok(default);
        };
        parse_flag(&raw).ok_or_else(|| invalid(var, format!("expected true/false, got \"{raw}\"")))
    };

    let log_level = lookup("SHOPGRAB_LOG_LEVEL").unwrap_or(defaults.log_level);
    let request_timeout_secs =
        parse_u64("SHOPGRAB_REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?;
    if request_timeout_secs == 0 {
        return Err(invalid(
            "SHOPGRAB_REQUEST_TIMEOUT_SECS",
            "must be at least 1 second".to_string(),
        ));
    }
    let max_retries = parse_u32("SHOPGRAB_MAX_RETRIES", defaults.max_retries)?;
    let backoff_base_secs = parse_secs("SHOPGRAB_BACKOFF_BASE_SECS", defaults.backoff_base_secs)?;
    let backoff_jitter_secs =
        parse_secs("SHOPGRAB_BACKOFF_JITTER_SECS", defaults.backoff_jitter_secs)?;
    let pacing_min_ms = parse_u64("SHOPGRAB_PACING_MIN_MS", defaults.pacing_min_ms)?;
    let pacing_max_ms = parse_u64("SHOPGRAB_PACING_MAX_MS", defaults.pacing_max_ms)?;
    if pacing_min_ms > pacing_max_ms {
        return Err(invalid(
            "SHOPGRAB_PACING_MIN_MS",
            format!("{pacing_min_ms} exceeds SHOPGRAB_PACING_MAX_MS ({pacing_max_ms})"),
        ));
    }
    let use_proxies = parse_bool("SHOPGRAB_USE_PROXIES", defaults.use_proxies)?;
    let proxy_file = lookup("SHOPGRAB_PROXY_FILE").map_or(defaults.proxy_file, PathBuf::from);
    let region = match lookup("SHOPGRAB_REGION") {
        Ok(raw) => raw
            .parse::<Region>()
            .map_err(|reason| invalid("SHOPGRAB_REGION", reason))?,
        Err(_) => defaults.region,
    };
    let randomize_user_agent =
        parse_bool("SHOPGRAB_RANDOMIZE_USER_AGENT", defaults.randomize_user_agent)?;

    Ok(ScraperConfig {
        log_level,
        request_timeout_secs,
        max_retries,
        backoff_base_secs,
        backoff_jitter_secs,
        pacing_min_ms,
        pacing_max_ms,
        use_proxies,
        proxy_file,
        region,
        randomize_user_agent,
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a newline-delimited proxy list (`scheme://host:port` per line).
///
/// Blank lines and lines starting with `#` are skipped; surrounding
/// whitespace is trimmed. Order is preserved.
#[must_use]
pub fn parse_proxy_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect()
}

/// Read and parse a proxy list file.
///
/// # Errors
///
/// Returns [`ConfigError::ProxyList`] if the file cannot be read.
pub fn load_proxy_list(path: &Path) -> Result<Vec<String>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ProxyList {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_proxy_list(&text))
}

/// Resolve the proxy endpoints to rotate through for `config`.
///
/// Returns an empty list when proxies are disabled. When they are enabled
/// but the file is missing, rotation is disabled with a warning rather
/// than failing startup.
///
/// # Errors
///
/// Returns [`ConfigError::ProxyList`] for read failures other than
/// "file not found".
pub fn resolve_proxies(config: &ScraperConfig) -> Result<Vec<String>, ConfigError> {
    if !config.use_proxies {
        return Ok(Vec::new());
    }
    match load_proxy_list(&config.proxy_file) {
        Ok(proxies) => {
            if proxies.is_empty() {
                tracing::warn!(
                    path = %config.proxy_file.display(),
                    "proxy file is empty; proxy rotation disabled"
                );
            }
            Ok(proxies)
        }
        Err(ConfigError::ProxyList { path, source })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            tracing::warn!(
                path = %path.display(),
                "proxy file not found; proxy rotation disabled"
            );
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
