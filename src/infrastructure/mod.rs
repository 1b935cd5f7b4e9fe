//! Infrastructure layer with cache, transport and configuration adapters.

/// Application configuration.
pub mod config;
/// Image caches, the shared cache gateway and the HTTP fetcher.
pub mod image;

pub use config::{AppConfig, CacheBackend, CliArgs, ConfigStore, LogLevel};
pub use image::{
    CacheStats, DiskImageCache, HttpFetcherConfig, HttpImageFetcher, ImageCacheGateway,
    MemoryImageCache, ResponseImageCache,
};
