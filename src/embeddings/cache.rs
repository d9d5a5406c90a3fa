use lru::LruCache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub struct EmbeddingCache {
    cache: Mutex<LruCache<String, (Vec<f32>, Instant)>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub hit_rate: f64,
}

impl EmbeddingCache {
    /// A zero capacity is bumped to one entry.
    pub fn new(capacity: usize, ttl_secs: u64) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            ttl: Duration::from_secs(ttl_secs),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<f32>> {
        let mut cache = self.cache.lock();
        match cache.get(key) {
            Some((value, timestamp)) if timestamp.elapsed() < self.ttl => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn set(&self, key: &str, value: Vec<f32>) {
        let mut cache = self.cache.lock();
        cache.put(key.to_string(), (value, Instant::now()));
    }

    pub fn make_key(model: &str, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update([0u8]);
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 { hits as f64 / total as f64 } else { 0.0 };
        let cache = self.cache.lock();

        CacheStats {
            hits,
            misses,
            size: cache.len(),
            hit_rate,
        }
    }

    pub fn clear(&self) {
        let mut cache = self.cache.lock();
        cache.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_and_miss_counters() {
        let cache = EmbeddingCache::new(4, 300);
        assert!(cache.get("a").is_none());
        cache.set("a", vec![1.0]);
        assert_eq!(cache.get("a"), Some(vec![1.0]));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert!((stats.hit_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = EmbeddingCache::new(1, 300);
        cache.set("a", vec![1.0]);
        cache.set("b", vec![2.0]);
        assert!(cache.get("a").is_none());
        assert_eq!(cache.get("b"), Some(vec![2.0]));
    }

    #[test]
    fn test_expired_entries_miss() {
        let cache = EmbeddingCache::new(4, 0);
        cache.set("a", vec![1.0]);
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn test_keys_depend_on_model() {
        assert_ne!(
            EmbeddingCache::make_key("m1", "text"),
            EmbeddingCache::make_key("m2", "text")
        );
        assert_eq!(
            EmbeddingCache::make_key("m1", "text"),
            EmbeddingCache::make_key("m1", "text")
        );
    }

    #[test]
    fn test_key_separates_model_from_text() {
        // Without the separator both would hash "ab" + "c".
        assert_ne!(
            EmbeddingCache::make_key("ab", "c"),
            EmbeddingCache::make_key("a", "bc")
        );
        assert_eq!(EmbeddingCache::make_key("nomic-embed-text", "x").len(), 64);
    }

    #[test]
    fn test_vector_cached_under_one_model_misses_for_another() {
        let cache = EmbeddingCache::new(4, 300);
        let nomic = EmbeddingCache::make_key("nomic-embed-text", "parse json");
        let minilm = EmbeddingCache::make_key("all-minilm", "parse json");

        cache.set(&nomic, vec![0.5, 0.5]);
        assert!(cache.get(&minilm).is_none());
        assert_eq!(cache.get(&nomic), Some(vec![0.5, 0.5]));

        cache.set(&minilm, vec![0.1]);
        assert_eq!(cache.stats().size, 2);
        assert_eq!(cache.get(&nomic), Some(vec![0.5, 0.5]));
    }

    #[test]
    fn test_clear_resets_entries_and_counters() {
        let cache = EmbeddingCache::new(4, 300);
        let key = EmbeddingCache::make_key("nomic-embed-text", "text");
        cache.set(&key, vec![1.0]);
        assert!(cache.get(&key).is_some());

        cache.clear();
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.size), (0, 0, 0));
        assert!(cache.get(&key).is_none());
    }
}
