//! Port definitions for the image cache.
//!
//! A cache either works on plain string keys or on whole HTTP requests. The
//! two shapes are separate traits joined by [`ImageCache`], so callers branch
//! on [`ImageCache::capability`] at runtime instead of knowing the concrete type.

use std::sync::Arc;

use bytes::Bytes;

use crate::domain::entities::{PhotoImage, RequestIdentity, ResponseMetadata};

/// Cache addressed by raw string keys (usually the photo URL).
/// Implementations must be thread-safe.
pub trait KeyedImageCache: Send + Sync {
    /// Returns the image stored under `key`.
    fn image_for_key(&self, key: &str) -> Option<PhotoImage>;

    /// Stores an image under `key`, replacing any previous entry.
    fn set_image(&self, image: PhotoImage, key: &str);

    /// Removes the entry for `key`.
    fn remove_image(&self, key: &str);

    /// Removes every entry.
    fn remove_all_images(&self);
}

/// Cache addressed by full request identity, storing raw responses.
/// Implementations must be thread-safe.
pub trait RequestImageCache: Send + Sync {
    /// Returns a decoded image for a request equivalent to `request`.
    fn image_for_request(&self, request: &RequestIdentity) -> Option<PhotoImage>;

    /// Stores the raw body and response metadata for `request`.
    /// Implementations decide whether the response is storable.
    fn set_image_data(&self, data: Bytes, response: &ResponseMetadata, request: &RequestIdentity);

    /// Removes the entry for `request`.
    fn remove_image_for_request(&self, request: &RequestIdentity);

    /// Removes every entry.
    fn remove_all_images(&self);
}

/// Which lookup shape a cache supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCapability {
    /// String key → image.
    Keyed,
    /// Request identity → response data.
    Request,
}

impl std::fmt::Display for CacheCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keyed => write!(f, "keyed"),
            Self::Request => write!(f, "request"),
        }
    }
}

/// An installed cache implementation, tagged with its capability.
#[derive(Clone)]
pub enum ImageCache {
    /// Key-based cache.
    Keyed(Arc<dyn KeyedImageCache>),
    /// Request-based cache.
    Request(Arc<dyn RequestImageCache>),
}

impl ImageCache {
    /// Wraps a key-based cache.
    pub fn keyed(cache: impl KeyedImageCache + 'static) -> Self {
        Self::Keyed(Arc::new(cache))
    }

    /// Wraps a request-based cache.
    pub fn request(cache: impl RequestImageCache + 'static) -> Self {
        Self::Request(Arc::new(cache))
    }

    /// Returns the capability of the wrapped cache.
    #[must_use]
    pub const fn capability(&self) -> CacheCapability {
        match self {
            Self::Keyed(_) => CacheCapability::Keyed,
            Self::Request(_) => CacheCapability::Request,
        }
    }

    /// Returns true if the wrapped cache looks images up by request.
    #[must_use]
    pub const fn supports_request_lookup(&self) -> bool {
        matches!(self, Self::Request(_))
    }

    /// Removes every entry from the wrapped cache.
    pub fn remove_all_images(&self) {
        match self {
            Self::Keyed(cache) => cache.remove_all_images(),
            Self::Request(cache) => cache.remove_all_images(),
        }
    }
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ImageCache")
            .field(&self.capability())
            .finish()
    }
}

#[cfg(test)]
#[allow(dead_code)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    /// Keyed cache that counts every read and write.
    #[derive(Default)]
    pub struct CountingKeyedCache {
        pub entries: Mutex<HashMap<String, PhotoImage>>,
        pub reads: AtomicUsize,
        pub writes: AtomicUsize,
    }

    impl CountingKeyedCache {
        pub fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        pub fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    impl KeyedImageCache for CountingKeyedCache {
        fn image_for_key(&self, key: &str) -> Option<PhotoImage> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.entries.lock().get(key).cloned()
        }

        fn set_image(&self, image: PhotoImage, key: &str) {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.entries.lock().insert(key.to_string(), image);
        }

        fn remove_image(&self, key: &str) {
            self.entries.lock().remove(key);
        }

        fn remove_all_images(&self) {
            self.entries.lock().clear();
        }
    }

    /// Request cache that keeps the last stored response per cache key.
    #[derive(Default)]
    pub struct CountingRequestCache {
        pub entries: Mutex<HashMap<String, (Bytes, ResponseMetadata, RequestIdentity)>>,
        pub reads: AtomicUsize,
        pub writes: AtomicUsize,
        pub last_writer: Mutex<Option<std::thread::ThreadId>>,
    }

    impl CountingRequestCache {
        pub fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        pub fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    impl RequestImageCache for CountingRequestCache {
        fn image_for_request(&self, request: &RequestIdentity) -> Option<PhotoImage> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let entries = self.entries.lock();
            let (data, _, _) = entries.get(&request.cache_key())?;
            crate::domain::entities::decode_image(data).ok()
        }

        fn set_image_data(&self, data: Bytes, response: &ResponseMetadata, request: &RequestIdentity) {
            self.writes.fetch_add(1, Ordering::SeqCst);
            *self.last_writer.lock() = Some(std::thread::current().id());
            self.entries
                .lock()
                .insert(request.cache_key(), (data, response.clone(), request.clone()));
        }

        fn remove_image_for_request(&self, request: &RequestIdentity) {
            self.entries.lock().remove(&request.cache_key());
        }

        fn remove_all_images(&self) {
            self.entries.lock().clear();
        }
    }
}
