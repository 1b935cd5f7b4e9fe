//! Process-wide access point to the active image cache.

use std::sync::{Arc, LazyLock};

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{debug, trace};

use super::memory_cache::MemoryImageCache;
use crate::domain::entities::{PhotoImage, RequestIdentity, ResponseMetadata};
use crate::domain::ports::{CacheCapability, ImageCache};

static SHARED: LazyLock<Arc<ImageCacheGateway>> =
    LazyLock::new(|| Arc::new(ImageCacheGateway::default()));

/// Forwards lookups and stores to whichever cache is installed.
///
/// Key-based calls are ignored while a request-based cache is installed and
/// the other way round. The installed cache may be swapped at any time; calls
/// already in flight finish against the previous one.
pub struct ImageCacheGateway {
    cache: RwLock<ImageCache>,
}

impl ImageCacheGateway {
    /// Creates a gateway over `cache`.
    #[must_use]
    pub fn new(cache: ImageCache) -> Self {
        Self {
            cache: RwLock::new(cache),
        }
    }

    /// The gateway shared by the whole process.
    /// Created on first use with an in-memory key-based cache.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::clone(&SHARED)
    }

    /// Replaces the installed cache.
    pub fn install(&self, cache: ImageCache) {
        debug!(capability = %cache.capability(), "Installing image cache");
        *self.cache.write() = cache;
    }

    /// Returns a handle to the installed cache.
    #[must_use]
    pub fn cache(&self) -> ImageCache {
        self.cache.read().clone()
    }

    /// Returns the capability of the installed cache.
    #[must_use]
    pub fn capability(&self) -> CacheCapability {
        self.cache.read().capability()
    }

    /// Returns true if the installed cache looks images up by request.
    #[must_use]
    pub fn supports_request_lookup(&self) -> bool {
        self.cache.read().supports_request_lookup()
    }

    /// Looks an image up by key.
    #[must_use]
    pub fn image_for_key(&self, key: &str) -> Option<PhotoImage> {
        match self.cache() {
            ImageCache::Keyed(cache) => cache.image_for_key(key),
            ImageCache::Request(_) => {
                trace!(key, "Keyed lookup against request cache ignored");
                None
            }
        }
    }

    /// Stores an image by key.
    pub fn set_image(&self, image: PhotoImage, key: &str) {
        match self.cache() {
            ImageCache::Keyed(cache) => cache.set_image(image, key),
            ImageCache::Request(_) => trace!(key, "Keyed store against request cache ignored"),
        }
    }

    /// Removes the entry stored under `key`.
    pub fn remove_image(&self, key: &str) {
        if let ImageCache::Keyed(cache) = self.cache() {
            cache.remove_image(key);
        }
    }

    /// Looks an image up by request.
    #[must_use]
    pub fn image_for_request(&self, request: &RequestIdentity) -> Option<PhotoImage> {
        match self.cache() {
            ImageCache::Request(cache) => cache.image_for_request(request),
            ImageCache::Keyed(_) => {
                trace!(request = %request, "Request lookup against keyed cache ignored");
                None
            }
        }
    }

    /// Stores a raw response for `request`.
    pub fn set_image_data(&self, data: Bytes, response: &ResponseMetadata, request: &RequestIdentity) {
        match self.cache() {
            ImageCache::Request(cache) => cache.set_image_data(data, response, request),
            ImageCache::Keyed(_) => {
                trace!(request = %request, "Request store against keyed cache ignored");
            }
        }
    }

    /// Removes the entry stored for `request`.
    pub fn remove_image_for_request(&self, request: &RequestIdentity) {
        if let ImageCache::Request(cache) = self.cache() {
            cache.remove_image_for_request(request);
        }
    }

    /// Removes every entry from the installed cache.
    pub fn remove_all_images(&self) {
        self.cache().remove_all_images();
    }
}

impl Default for ImageCacheGateway {
    fn default() -> Self {
        Self::new(ImageCache::keyed(MemoryImageCache::default()))
    }
}

impl std::fmt::Debug for ImageCacheGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCacheGateway")
            .field("capability", &self.capability())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::image::ResponseImageCache;

    fn img() -> PhotoImage {
        Arc::new(image::DynamicImage::new_rgb8(2, 2))
    }

    fn png() -> Bytes {
        let mut buf = Vec::new();
        image::DynamicImage::new_rgb8(2, 2)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        Bytes::from(buf)
    }

    #[test]
    fn test_shared_defaults_to_keyed() {
        assert_eq!(ImageCacheGateway::default().capability(), CacheCapability::Keyed);
        assert!(Arc::ptr_eq(
            &ImageCacheGateway::shared(),
            &ImageCacheGateway::shared()
        ));
    }

    #[test]
    fn test_keyed_round_trip() {
        let gateway = ImageCacheGateway::default();
        gateway.set_image(img(), "https://x/img.png");

        assert!(gateway.image_for_key("https://x/img.png").is_some());
        assert!(!gateway.supports_request_lookup());
    }

    #[test]
    fn test_request_calls_ignored_by_keyed_cache() {
        let gateway = ImageCacheGateway::default();
        let request = RequestIdentity::get("https://x/img.png").unwrap();

        gateway.set_image_data(png(), &ResponseMetadata::new(200, "https://x/img.png"), &request);
        assert!(gateway.image_for_request(&request).is_none());
    }

    #[test]
    fn test_install_switches_capability() {
        let gateway = ImageCacheGateway::default();
        gateway.set_image(img(), "https://x/img.png");

        gateway.install(ImageCache::request(ResponseImageCache::default()));

        assert!(gateway.supports_request_lookup());
        assert!(gateway.image_for_key("https://x/img.png").is_none());

        let request = RequestIdentity::get("https://x/img.png").unwrap();
        gateway.set_image_data(png(), &ResponseMetadata::new(200, "https://x/img.png"), &request);
        assert!(gateway.image_for_request(&request).is_some());

        gateway.remove_image_for_request(&request);
        assert!(gateway.image_for_request(&request).is_none());
    }

    #[test]
    fn test_remove_all_images() {
        let gateway = ImageCacheGateway::default();
        gateway.set_image(img(), "a");
        gateway.set_image(img(), "b");

        gateway.remove_image("a");
        assert!(gateway.image_for_key("a").is_none());

        gateway.remove_all_images();
        assert!(gateway.image_for_key("b").is_none());
    }
}
