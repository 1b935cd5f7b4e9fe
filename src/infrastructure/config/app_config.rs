//! Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::args::CliArgs;
use crate::application::services::DEFAULT_EVENT_CAPACITY;
use crate::domain::errors::CacheResult;
use crate::domain::ports::ImageCache;
use crate::infrastructure::image::disk_cache::{DEFAULT_MAX_CACHE_SIZE, default_cache_dir};
use crate::infrastructure::image::http_fetcher::DEFAULT_USER_AGENT;
use crate::infrastructure::image::memory_cache::DEFAULT_CACHE_SIZE;
use crate::infrastructure::image::{
    DiskImageCache, HttpFetcherConfig, MemoryImageCache, ResponseImageCache,
};

pub(super) const APP_NAME: &str = "photo-gallery";
pub(super) const APP_QUALIFIER: &str = "com";
pub(super) const APP_ORGANIZATION: &str = "photo-gallery";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Which cache implementation backs the shared gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Decoded images in memory, keyed by URL.
    #[default]
    Memory,
    /// Raw responses in memory, keyed by request.
    Response,
    /// Raw responses on disk, keyed by request.
    Disk,
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Response => write!(f, "response"),
            Self::Disk => write!(f, "disk"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log file path. Logs go to stderr when unset.
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Image cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// HTTP configuration.
    #[serde(default)]
    pub http: HttpConfig,

    /// Completion event configuration.
    #[serde(default)]
    pub events: EventsConfig,
}

/// Image cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache implementation.
    #[serde(default)]
    pub backend: CacheBackend,

    /// Entries kept by the in-memory backends.
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,

    /// Directory for the disk backend.
    #[serde(default)]
    pub disk_dir: Option<PathBuf>,

    /// Size budget for the disk backend, in bytes.
    #[serde(default = "default_disk_max_size")]
    pub disk_max_size: u64,

    /// Whether photos read and write the cache.
    #[serde(default)]
    pub cache_photos: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            memory_capacity: default_memory_capacity(),
            disk_dir: None,
            disk_max_size: default_disk_max_size(),
            cache_photos: false,
        }
    }
}

impl CacheConfig {
    /// Returns the disk cache directory, falling back to the platform cache dir.
    #[must_use]
    pub fn effective_disk_dir(&self) -> PathBuf {
        self.disk_dir.clone().unwrap_or_else(default_cache_dir)
    }

    /// Builds the configured cache.
    ///
    /// # Errors
    /// Returns error if the disk cache directory cannot be prepared.
    pub fn build(&self) -> CacheResult<ImageCache> {
        Ok(match self.backend {
            CacheBackend::Memory => ImageCache::keyed(MemoryImageCache::new(self.memory_capacity)),
            CacheBackend::Response => {
                ImageCache::request(ResponseImageCache::new(self.memory_capacity))
            }
            CacheBackend::Disk => ImageCache::request(DiskImageCache::new(
                self.effective_disk_dir(),
                self.disk_max_size,
            )?),
        })
    }
}

/// HTTP configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User agent for photo requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds. Unset keeps the transport default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }
}

impl HttpConfig {
    /// Converts to fetcher configuration.
    #[must_use]
    pub fn fetcher_config(&self) -> HttpFetcherConfig {
        HttpFetcherConfig {
            user_agent: self.user_agent.clone(),
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Completion event configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Events buffered per subscriber.
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

const fn default_memory_capacity() -> usize {
    DEFAULT_CACHE_SIZE
}

const fn default_disk_max_size() -> u64 {
    DEFAULT_MAX_CACHE_SIZE
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

const fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(backend) = args.cache_backend {
            self.cache.backend = backend;
        }
        if let Some(cache_photos) = args.cache_photos {
            self.cache.cache_photos = cache_photos;
        }
        if let Some(disk_dir) = &args.disk_dir {
            self.cache.disk_dir = Some(disk_dir.clone());
        }
        if let Some(timeout_secs) = args.timeout_secs {
            self.http.timeout_secs = Some(timeout_secs);
        }
    }
}
