//! In-memory request-level cache of raw image responses.

use std::num::NonZeroUsize;

use bytes::Bytes;
use chrono::Utc;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::http_cache::CachedResponse;
use crate::domain::entities::{PhotoImage, RequestIdentity, ResponseMetadata, decode_image};
use crate::domain::ports::RequestImageCache;

/// Default maximum number of responses kept in memory.
pub const DEFAULT_RESPONSE_CACHE_SIZE: usize = 50;

struct ResponseEntry {
    record: CachedResponse,
    body: Bytes,
}

/// LRU of raw responses keyed by request, decoded on lookup.
///
/// Honors `no-store`, `max-age` and `Vary`; stale entries are dropped when
/// they are looked up.
pub struct ResponseImageCache {
    entries: Mutex<LruCache<String, ResponseEntry>>,
}

impl ResponseImageCache {
    /// Creates a cache holding at most `capacity` responses.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Returns the number of stored responses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the stored body for `request`, if it still serves it.
    #[must_use]
    pub fn data_for_request(&self, request: &RequestIdentity) -> Option<Bytes> {
        let key = request.cache_key();
        let mut entries = self.entries.lock();
        let entry = entries.get(&key)?;
        if !entry.record.matches(request) {
            trace!(request = %request, "Response cache vary mismatch");
            return None;
        }
        if !entry.record.is_fresh(Utc::now()) {
            debug!(request = %request, "Dropping stale cached response");
            entries.pop(&key);
            return None;
        }
        Some(entry.body.clone())
    }
}

impl Default for ResponseImageCache {
    fn default() -> Self {
        Self::new(DEFAULT_RESPONSE_CACHE_SIZE)
    }
}

impl RequestImageCache for ResponseImageCache {
    fn image_for_request(&self, request: &RequestIdentity) -> Option<PhotoImage> {
        let Some(body) = self.data_for_request(request) else {
            trace!(request = %request, "Response cache miss");
            return None;
        };
        match decode_image(&body) {
            Ok(image) => {
                trace!(request = %request, "Response cache hit");
                Some(image)
            }
            Err(e) => {
                warn!(request = %request, error = %e, "Failed to decode cached response");
                self.entries.lock().pop(&request.cache_key());
                None
            }
        }
    }

    fn set_image_data(&self, data: Bytes, response: &ResponseMetadata, request: &RequestIdentity) {
        let Some(record) = CachedResponse::storable(request, response) else {
            debug!(request = %request, status = response.status, "Response not storable");
            return;
        };
        debug!(request = %request, size = data.len(), "Storing response in memory cache");
        self.entries
            .lock()
            .put(request.cache_key(), ResponseEntry { record, body: data });
    }

    fn remove_image_for_request(&self, request: &RequestIdentity) {
        if self.entries.lock().pop(&request.cache_key()).is_some() {
            debug!(request = %request, "Evicted response from memory cache");
        }
    }

    fn remove_all_images(&self) {
        self.entries.lock().clear();
        debug!("Cleared response cache");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn png(w: u32, h: u32) -> Bytes {
        let mut buf = Vec::new();
        image::DynamicImage::new_rgb8(w, h)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        Bytes::from(buf)
    }

    fn request(url: &str) -> RequestIdentity {
        RequestIdentity::get(url).unwrap()
    }

    #[test]
    fn test_store_then_lookup_equivalent_request() {
        let cache = ResponseImageCache::new(4);
        let response = ResponseMetadata::new(200, "https://x/img.png");

        cache.set_image_data(png(5, 3), &response, &request("https://x/img.png"));
        let image = cache.image_for_request(&request("https://x/img.png")).unwrap();

        assert_eq!((image.width(), image.height()), (5, 3));
    }

    #[test]
    fn test_no_store_response_is_skipped() {
        let cache = ResponseImageCache::new(4);
        let response =
            ResponseMetadata::new(200, "https://x/img.png").with_header("cache-control", "no-store");

        cache.set_image_data(png(1, 1), &response, &request("https://x/img.png"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_stale_entry_is_dropped() {
        let cache = ResponseImageCache::new(4);
        let response = ResponseMetadata::new(200, "https://x/img.png")
            .with_header("cache-control", "max-age=10")
            .received_at(Utc::now() - Duration::seconds(60));

        cache.set_image_data(png(1, 1), &response, &request("https://x/img.png"));
        assert_eq!(cache.len(), 1);

        assert!(cache.image_for_request(&request("https://x/img.png")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_undecodable_body_is_a_miss() {
        let cache = ResponseImageCache::new(4);
        let response = ResponseMetadata::new(200, "https://x/img.png");

        cache.set_image_data(Bytes::from_static(b"<html>"), &response, &request("https://x/img.png"));
        assert!(cache.image_for_request(&request("https://x/img.png")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_remove_entries() {
        let cache = ResponseImageCache::new(4);
        let response = ResponseMetadata::new(200, "https://x/a.png");
        cache.set_image_data(png(1, 1), &response, &request("https://x/a.png"));
        cache.set_image_data(png(1, 1), &response, &request("https://x/b.png"));

        cache.remove_image_for_request(&request("https://x/a.png"));
        assert_eq!(cache.len(), 1);

        cache.remove_all_images();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let cache = std::sync::Arc::new(ResponseImageCache::new(2));

        let workers: Vec<_> = (0..6_u32)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    let url = format!("https://x/{}.png", i % 3);
                    let req = request(&url);
                    for _ in 0..40 {
                        cache.set_image_data(png(i % 3 + 1, 1), &ResponseMetadata::new(200, &url), &req);
                        if let Some(image) = cache.image_for_request(&req) {
                            assert_eq!(image.width(), i % 3 + 1);
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert!(cache.len() <= 2);
    }
}
