mod image_cache_port;
mod image_fetch_port;

pub use image_cache_port::{CacheCapability, ImageCache, KeyedImageCache, RequestImageCache};
pub use image_fetch_port::ImageFetchPort;

#[cfg(test)]
pub mod mocks {
    pub use super::image_cache_port::mock::{CountingKeyedCache, CountingRequestCache};
    pub use super::image_fetch_port::MockImageFetchPort;
}
