//! Image cache error types.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Errors raised while setting up or writing a persistent cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error during cache operation.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Metadata sidecar could not be encoded or decoded.
    #[error("cache metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}
