//! In-process TTL key-value cache used ahead of the durable OCR/analysis stores
//! (cache-aside with write-through, spec.md GLOSSARY).
use std::time::{Duration, Instant};

use dashmap::DashMap;

pub trait KvCache<V: Clone>: Send + Sync {
    fn get(&self, key: &str) -> Option<V>;
    fn put_with_ttl(&self, key: String, value: V, ttl: Duration);
}

pub struct InProcessCache<V> {
    entries: DashMap<String, (V, Instant)>,
}

impl<V> Default for InProcessCache<V> {
    fn default() -> Self {
        Self { entries: DashMap::new() }
    }
}

impl<V> InProcessCache<V> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<V: Clone + Send + Sync> KvCache<V> for InProcessCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;
        let (value, expires_at) = entry.value();
        if Instant::now() >= *expires_at {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        Some(value.clone())
    }

    fn put_with_ttl(&self, key: String, value: V, ttl: Duration) {
        self.entries.insert(key, (value, Instant::now() + ttl));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let cache: InProcessCache<String> = InProcessCache::new();
        cache.put_with_ttl("k".to_string(), "v".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some("v".to_string()));
    }

    #[test]
    fn expired_entry_is_absent() {
        let cache: InProcessCache<String> = InProcessCache::new();
        cache.put_with_ttl("k".to_string(), "v".to_string(), Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("k"), None);
    }
}
