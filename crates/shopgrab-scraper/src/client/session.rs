use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::Url;

/// Appends the `_` cache-buster query parameter.
///
/// An explicit nonce is always used; otherwise sites that bust caches get
/// the current unix time in seconds.
pub(super) fn apply_nonce(mut url: Url, explicit: Option<&str>, cache_buster: bool) -> Url {
    let nonce = match explicit {
        Some(nonce) => nonce.to_owned(),
        None if cache_buster => unix_secs().to_string(),
        None => return url,
    };
    url.query_pairs_mut().append_pair("_", &nonce);
    url
}

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://shop.test/dp/B000000001").unwrap()
    }

    #[test]
    fn no_nonce_leaves_url_untouched() {
        assert_eq!(apply_nonce(url(), None, false), url());
    }

    #[test]
    fn explicit_nonce_wins() {
        let busted = apply_nonce(url(), Some("42"), true);
        assert_eq!(busted.query(), Some("_=42"));
    }

    #[test]
    fn generated_nonce_is_recent() {
        let busted = apply_nonce(url(), None, true);
        let (_, value) = busted.query_pairs().next().unwrap();
        let secs: u64 = value.parse().unwrap();
        // 2023-11-14, well before any test run.
        assert!(secs > 1_700_000_000);
    }
}
