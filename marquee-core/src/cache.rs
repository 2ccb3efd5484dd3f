//! Short-TTL memo of aggregation results.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::types::{StreamSource, TitleId};

/// Process-wide cache of aggregation results, keyed by title identifier.
///
/// Constructed once at process start and injected wherever needed; there
/// is no teardown, entries simply age out. Expiry is lazy: `get` treats
/// an entry older than the TTL as absent but never prunes proactively.
/// Writes are last-writer-wins; concurrent aggregations for the same key
/// are not coalesced.
#[derive(Debug)]
pub struct ResultCache {
    ttl: Duration,
    entries: RwLock<HashMap<TitleId, CacheEntry>>,
}

#[derive(Debug)]
struct CacheEntry {
    created_at: Instant,
    sources: Vec<StreamSource>,
}

impl ResultCache {
    /// Creates a cache whose entries stay fresh for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached sources for `key` if a fresh entry exists.
    pub fn get(&self, key: &TitleId) -> Option<Vec<StreamSource>> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if entry.created_at.elapsed() >= self.ttl {
            return None;
        }
        tracing::debug!(title = %key, count = entry.sources.len(), "result cache hit");
        Some(entry.sources.clone())
    }

    /// Stores the sources for `key`, overwriting any previous entry.
    pub fn put(&self, key: &TitleId, sources: Vec<StreamSource>) {
        let entry = CacheEntry {
            created_at: Instant::now(),
            sources,
        };
        self.entries.write().insert(key.clone(), entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(url: &str) -> StreamSource {
        StreamSource::new(url, "1080p", "A").unwrap()
    }

    fn title(raw: &str) -> TitleId {
        TitleId::parse(raw).unwrap()
    }

    #[test]
    fn fresh_entries_are_returned() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.put(&title("550"), vec![source("https://a.example/x.m3u8")]);

        let hit = cache.get(&title("550")).unwrap();
        assert_eq!(hit.len(), 1);
        assert!(cache.get(&title("551")).is_none());
    }

    #[test]
    fn expired_entries_are_treated_as_absent() {
        let cache = ResultCache::new(Duration::from_millis(10));
        cache.put(&title("550"), vec![source("https://a.example/x.m3u8")]);

        std::thread::sleep(Duration::from_millis(25));
        assert!(cache.get(&title("550")).is_none());
    }

    #[test]
    fn put_overwrites_instead_of_merging() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.put(&title("550"), vec![source("https://a.example/x.m3u8")]);
        cache.put(&title("550"), vec![source("https://b.example/y.mp4")]);

        let hit = cache.get(&title("550")).unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].url, "https://b.example/y.mp4");
    }

    #[test]
    fn empty_result_lists_are_cacheable() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.put(&title("550"), Vec::new());
        assert_eq!(cache.get(&title("550")), Some(Vec::new()));
    }
}
