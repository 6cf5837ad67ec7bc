//! Request identities: the user agent and proxy used for one attempt.
//!
//! A fresh identity is selected before every attempt, retries included.
//! Cookies are not part of the value here; they live in the transport's
//! session jar and persist across attempts.

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::proxy::ProxyPool;

/// Desktop browser strings used when randomized synthesis is disabled or
/// a custom pool is empty.
pub const FALLBACK_USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.131 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:90.0) Gecko/20100101 Firefox/90.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
];

const CHROME_PLATFORMS: [&str; 3] = [
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "X11; Linux x86_64",
];

const FIREFOX_PLATFORMS: [&str; 3] = [
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10.15",
    "X11; Linux x86_64",
];

/// The user agent and optional proxy endpoint for one request attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_agent: String,
    pub proxy: Option<String>,
}

/// Source of user-agent strings.
#[derive(Debug, Clone)]
pub struct UserAgentPool {
    agents: Vec<String>,
    randomize: bool,
}

impl UserAgentPool {
    /// Pool over [`FALLBACK_USER_AGENTS`]. With `randomize`, strings are
    /// synthesized with random recent browser versions instead.
    #[must_use]
    pub fn new(randomize: bool) -> Self {
        Self {
            agents: FALLBACK_USER_AGENTS.iter().map(|s| (*s).to_owned()).collect(),
            randomize,
        }
    }

    /// Pool over a caller-supplied list, never synthesized. An empty list
    /// falls back to [`FALLBACK_USER_AGENTS`].
    #[must_use]
    pub fn with_agents(agents: Vec<String>) -> Self {
        if agents.is_empty() {
            return Self::new(false);
        }
        Self {
            agents,
            randomize: false,
        }
    }

    /// Picks a user agent for the next attempt.
    #[must_use]
    pub fn pick(&self) -> String {
        let mut rng = rand::rng();
        if self.randomize {
            return synthesize_user_agent(&mut rng);
        }
        self.agents
            .choose(&mut rng)
            .cloned()
            .unwrap_or_else(|| FALLBACK_USER_AGENTS[0].to_owned())
    }
}

fn synthesize_user_agent<R: Rng>(rng: &mut R) -> String {
    if rng.random_bool(0.7) {
        let platform = CHROME_PLATFORMS[rng.random_range(0..CHROME_PLATFORMS.len())];
        let major = rng.random_range(120..=131);
        let build = rng.random_range(6000..=6800);
        let patch = rng.random_range(50..=200);
        format!(
            "Mozilla/5.0 ({platform}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{major}.0.{build}.{patch} Safari/537.36"
        )
    } else {
        let platform = FIREFOX_PLATFORMS[rng.random_range(0..FIREFOX_PLATFORMS.len())];
        let major = rng.random_range(120..=133);
        format!("Mozilla/5.0 ({platform}; rv:{major}.0) Gecko/20100101 Firefox/{major}.0")
    }
}

/// Rolls identities from a user-agent pool and an optional proxy pool.
#[derive(Debug, Clone)]
pub struct IdentitySelector {
    user_agents: UserAgentPool,
    proxies: ProxyPool,
}

impl IdentitySelector {
    #[must_use]
    pub fn new(user_agents: UserAgentPool, proxies: ProxyPool) -> Self {
        Self {
            user_agents,
            proxies,
        }
    }

    /// Picks a user agent and, when proxies are configured, the next
    /// non-failed proxy.
    pub fn select(&mut self) -> Identity {
        Identity {
            user_agent: self.user_agents.pick(),
            proxy: self.proxies.next_proxy(),
        }
    }

    /// Marks the proxy used by `identity` as failed, if it used one.
    pub fn mark_failed(&mut self, identity: &Identity) {
        if let Some(proxy) = &identity.proxy {
            if self.proxies.mark_failed(proxy) {
                tracing::debug!(proxy = %proxy, "proxy marked failed");
            }
        }
    }

    #[must_use]
    pub fn proxies(&self) -> &ProxyPool {
        &self.proxies
    }
}
