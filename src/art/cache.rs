//! Process-wide cache of confirmed artwork URLs.

use std::collections::HashMap;

/// Cache key: either a fetchable URL or the raw source string it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Url(String),
    Source(String),
}

impl CacheKey {
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    pub fn source(source: impl Into<String>) -> Self {
        Self::Source(source.into())
    }
}

/// Shared mapping from a key to the URL that is known to load.
///
/// Entries are never evicted during a session. Writing a key twice keeps
/// the last value.
#[derive(Debug, Default)]
pub struct ResolvedUrlCache {
    entries: HashMap<CacheKey, String>,
}

impl ResolvedUrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Look up a confirmed URL by its own value.
    pub fn get_url(&self, url: &str) -> Option<&str> {
        self.get(&CacheKey::url(url))
    }

    pub fn set(&mut self, key: CacheKey, value: impl Into<String>) {
        self.entries.insert(key, value.into());
    }

    #[allow(dead_code)]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_separate_namespaces() {
        let mut cache = ResolvedUrlCache::new();
        cache.set(CacheKey::source("/getaa?s=1"), "http://cdn/new.jpg");

        assert_eq!(
            cache.get(&CacheKey::source("/getaa?s=1")),
            Some("http://cdn/new.jpg")
        );
        assert_eq!(cache.get(&CacheKey::url("/getaa?s=1")), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let mut cache = ResolvedUrlCache::new();
        cache.set(CacheKey::url("http://a/1.jpg"), "http://a/1.jpg");
        cache.set(CacheKey::url("http://a/1.jpg"), "http://a/1.jpg");
        cache.set(CacheKey::source("s"), "http://a/1.jpg");
        cache.set(CacheKey::source("s"), "http://a/2.jpg");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_url("http://a/1.jpg"), Some("http://a/1.jpg"));
        assert_eq!(cache.get(&CacheKey::source("s")), Some("http://a/2.jpg"));
        assert!(cache.contains(&CacheKey::url("http://a/1.jpg")));
        assert!(!cache.contains(&CacheKey::url("s")));
    }
}
