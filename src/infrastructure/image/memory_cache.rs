//! In-memory LRU image cache keyed by string.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::domain::entities::PhotoImage;
use crate::domain::ports::KeyedImageCache;

/// Default maximum number of images to cache in memory.
pub const DEFAULT_CACHE_SIZE: usize = 50;

/// In-memory LRU cache for decoded images.
/// Thread-safe; every lookup promotes the entry.
pub struct MemoryImageCache {
    cache: Mutex<LruCache<String, PhotoImage>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryImageCache {
    /// Creates a new cache with the specified capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(cap)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Creates a new cache with the default capacity.
    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }

    /// Returns cache statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        CacheStats {
            hits,
            misses,
            hit_rate,
            size: self.len(),
        }
    }

    /// Peeks at an image without promoting it in the LRU or touching stats.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<PhotoImage> {
        self.cache.lock().peek(key).cloned()
    }

    /// Returns the number of cached images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryImageCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of cached images.
    pub size: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} images, {:.1}% hit rate ({} hits, {} misses)",
            self.size, self.hit_rate, self.hits, self.misses
        )
    }
}

impl KeyedImageCache for MemoryImageCache {
    fn image_for_key(&self, key: &str) -> Option<PhotoImage> {
        let mut cache = self.cache.lock();
        if let Some(img) = cache.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(key, "Memory cache hit");
            Some(img.clone())
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(key, "Memory cache miss");
            None
        }
    }

    fn set_image(&self, image: PhotoImage, key: &str) {
        debug!(key, "Storing image in memory cache");
        self.cache.lock().put(key.to_string(), image);
    }

    fn remove_image(&self, key: &str) {
        if self.cache.lock().pop(key).is_some() {
            debug!(key, "Evicted image from memory cache");
        }
    }

    fn remove_all_images(&self) {
        self.cache.lock().clear();
        debug!("Cleared memory image cache");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn img(w: u32) -> PhotoImage {
        Arc::new(image::DynamicImage::new_rgb8(w, w))
    }

    #[test]
    fn test_round_trip_returns_equal_image() {
        let cache = MemoryImageCache::new(10);
        let stored = img(12);

        cache.set_image(stored.clone(), "https://x/img.png");
        let retrieved = cache.image_for_key("https://x/img.png").unwrap();

        assert_eq!(*retrieved, *stored);
    }

    #[test]
    fn test_cache_miss() {
        let cache = MemoryImageCache::new(10);
        assert!(cache.image_for_key("nonexistent").is_none());
    }

    #[test]
    fn test_cache_eviction() {
        let cache = MemoryImageCache::new(2);

        cache.set_image(img(1), "a");
        cache.set_image(img(1), "b");
        cache.set_image(img(1), "c");

        // "a" is least recently used
        assert!(cache.image_for_key("a").is_none());
        assert!(cache.image_for_key("b").is_some());
        assert!(cache.image_for_key("c").is_some());
    }

    #[test]
    fn test_cache_stats() {
        let cache = MemoryImageCache::new(10);
        cache.set_image(img(1), "a");

        let _ = cache.image_for_key("a");
        let _ = cache.image_for_key("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert!(stats.to_string().contains("50.0% hit rate"));
    }

    #[test]
    fn test_peek_does_not_promote() {
        let cache = MemoryImageCache::new(2);
        cache.set_image(img(1), "a");
        cache.set_image(img(1), "b");

        let _ = cache.peek("a");
        cache.set_image(img(1), "c");

        assert!(cache.peek("a").is_none());
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = MemoryImageCache::new(4);
        cache.set_image(img(1), "a");
        cache.set_image(img(1), "b");

        cache.remove_image("a");
        assert!(cache.peek("a").is_none());
        assert_eq!(cache.len(), 1);

        cache.remove_all_images();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let cache = Arc::new(MemoryImageCache::new(4));

        let workers: Vec<_> = (0..8_u32)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    let key = format!("https://x/{}.png", i % 6);
                    for _ in 0..100 {
                        cache.set_image(img(i % 6 + 1), &key);
                        if let Some(image) = cache.image_for_key(&key) {
                            assert_eq!(image.width(), i % 6 + 1);
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let stats = cache.stats();
        assert!(cache.len() <= 4);
        assert_eq!(stats.hits + stats.misses, 800);
    }
}
