//! Image handling infrastructure.
//!
//! This module provides:
//! - The process-wide cache gateway
//! - Key-based memory caching with LRU eviction
//! - Request-based response caching in memory and on disk
//! - The HTTP fetcher

pub mod cache_gateway;
pub mod disk_cache;
pub mod http_cache;
pub mod http_fetcher;
pub mod memory_cache;
pub mod response_cache;

pub use cache_gateway::ImageCacheGateway;
pub use disk_cache::DiskImageCache;
pub use http_cache::{CacheControl, CachedResponse};
pub use http_fetcher::{HttpFetcherConfig, HttpImageFetcher};
pub use memory_cache::{CacheStats, MemoryImageCache};
pub use response_cache::ResponseImageCache;
