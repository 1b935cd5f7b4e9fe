//! Domain error types.

mod cache_error;
mod photo_error;

pub use cache_error::{CacheError, CacheResult};
pub use photo_error::PhotoError;
