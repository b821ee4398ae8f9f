use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use super::service::CatalogClient;
use crate::models::catalog::CatalogEntry;
use crate::utils::logger::Logger;
use crate::logger;

/// Serializes outbound catalog calls to at most one per interval.
///
/// Callers queue on the internal lock, so a burst of concurrent fetches
/// drains one at a time instead of failing or hammering the service.
pub struct RateLimiter {
    interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_call: Mutex::new(None),
        }
    }

    /// Waits until the next outbound slot is free and claims it.
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

/// Session-lifetime memoization of catalog entries by id.
///
/// The cache never evicts: the catalog is read-only, so an entry fetched
/// once stays valid for the whole session. Constructed and owned by the
/// application root and injected wherever hydration happens. Without a
/// client the cache runs offline and every fetch is silently skipped;
/// lookups then fall back to placeholder entries at hydration.
pub struct CatalogCache {
    client: Option<CatalogClient>,
    entries: RwLock<HashMap<String, CatalogEntry>>,
    limiter: RateLimiter,
}

impl CatalogCache {
    pub fn new(client: Option<CatalogClient>, interval: Duration) -> Self {
        Self {
            client,
            entries: RwLock::new(HashMap::new()),
            limiter: RateLimiter::new(interval),
        }
    }

    /// Cache with no network access. Useful for tests and offline mode.
    pub fn offline() -> Self {
        Self::new(None, Duration::from_millis(0))
    }

    /// Cache-only lookup. Never touches the network.
    pub fn lookup(&self, id: &str) -> Option<CatalogEntry> {
        let entries = self.entries.read().expect("Catalog cache lock poisoned");
        entries.get(id).cloned()
    }

    /// Lookup that always produces an entry: unresolvable ids come back as
    /// the "unknown card" placeholder instead of an error.
    pub fn resolve(&self, id: &str) -> CatalogEntry {
        self.lookup(id).unwrap_or_else(|| CatalogEntry::unknown(id))
    }

    pub fn insert(&self, entry: CatalogEntry) {
        let mut entries = self.entries.write().expect("Catalog cache lock poisoned");
        entries.insert(entry.id.clone(), entry);
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().expect("Catalog cache lock poisoned");
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetches every uncached id in `ids`, one rate-limited call at a time.
    ///
    /// Completes once all ids were attempted. Failures and misses are logged
    /// and skipped; hydration later substitutes placeholders for them.
    pub async fn prefetch(&self, ids: &HashSet<String>) {
        let Some(client) = &self.client else {
            return;
        };

        for id in ids {
            if self.lookup(id).is_some() {
                continue;
            }

            self.limiter.acquire().await;
            match client.get_by_id(id).await {
                Ok(Some(entry)) => self.insert(entry),
                Ok(None) => logger!(DEBUG, "[CATALOG] No entry for `{id}`"),
                Err(error) => logger!(WARN, "[CATALOG] Skipping prefetch of `{id}`: {error}"),
            }
        }
    }

    /// Network lookup by name; a hit populates the cache.
    pub async fn fetch_by_name(&self, name: &str, exact: bool) -> Option<CatalogEntry> {
        let client = self.client.as_ref()?;

        self.limiter.acquire().await;
        match client.get_by_name(name, exact).await {
            Ok(Some(entry)) => {
                self.insert(entry.clone());
                Some(entry)
            }
            Ok(None) => None,
            Err(error) => {
                logger!(WARN, "[CATALOG] Name lookup for `{name}` failed: {error}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, name: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            name: name.to_string(),
            mana_cost: String::new(),
            type_line: String::new(),
            oracle_text: String::new(),
            image_url: String::new(),
        }
    }

    #[test]
    fn test_lookup_hits_inserted_entry() {
        let cache = CatalogCache::offline();
        cache.insert(entry("abc", "Storm Crow"));

        let found = cache.lookup("abc").unwrap();
        assert_eq!(found.name, "Storm Crow");
    }

    #[test]
    fn test_lookup_miss_is_none() {
        let cache = CatalogCache::offline();
        assert!(cache.lookup("nope").is_none());
    }

    #[test]
    fn test_resolve_substitutes_placeholder() {
        let cache = CatalogCache::offline();
        let resolved = cache.resolve("stale-id");

        // The placeholder keeps the id and never errors.
        assert_eq!(resolved.id, "stale-id");
        assert_eq!(resolved.name, "Unknown card");
    }

    #[tokio::test]
    async fn test_offline_prefetch_is_silent() {
        let cache = CatalogCache::offline();
        let ids: HashSet<String> = ["a".to_string(), "b".to_string()].into();

        cache.prefetch(&ids).await;
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_spaces_out_calls() {
        let limiter = RateLimiter::new(Duration::from_millis(100));

        let started = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        // Three acquisitions need two full intervals between them.
        assert!(started.elapsed() >= Duration::from_millis(200));
    }
}
