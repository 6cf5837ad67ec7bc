//! Proxy rotation with failure bookkeeping.

use std::collections::HashSet;

/// Ordered proxy endpoints plus the subset currently marked failed.
///
/// Owned by exactly one site client and mutated only between attempts of
/// a single fetch.
#[derive(Debug, Clone, Default)]
pub struct ProxyPool {
    proxies: Vec<String>,
    failed: HashSet<String>,
    cursor: usize,
}

impl ProxyPool {
    #[must_use]
    pub fn new(proxies: Vec<String>) -> Self {
        Self {
            proxies,
            failed: HashSet::new(),
            cursor: 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    #[must_use]
    pub fn endpoints(&self) -> &[String] {
        &self.proxies
    }

    #[must_use]
    pub fn failed(&self) -> &HashSet<String> {
        &self.failed
    }

    #[must_use]
    pub fn is_failed(&self, proxy: &str) -> bool {
        self.failed.contains(proxy)
    }

    /// Returns the next proxy that is not marked failed, scanning forward
    /// from the rotation cursor with wrap-around.
    ///
    /// When every proxy is failed, the failed set is cleared and the first
    /// entry is reused. Returns `None` only for an empty pool.
    pub fn next_proxy(&mut self) -> Option<String> {
        if self.proxies.is_empty() {
            return None;
        }
        let len = self.proxies.len();
        for _ in 0..len {
            let candidate = &self.proxies[self.cursor];
            self.cursor = (self.cursor + 1) % len;
            if !self.failed.contains(candidate) {
                return Some(candidate.clone());
            }
        }
        tracing::warn!(pool_size = len, "all proxies failed; resetting failed set");
        self.failed.clear();
        self.cursor = 1 % len;
        Some(self.proxies[0].clone())
    }

    /// Marks `proxy` failed. Returns `true` if it was not already failed.
    pub fn mark_failed(&mut self, proxy: &str) -> bool {
        self.failed.insert(proxy.to_owned())
    }
}
