//! Port definition for fetching photo bytes.

use async_trait::async_trait;

use crate::domain::entities::{FetchedResponse, RequestIdentity};
use crate::domain::errors::PhotoError;

/// Port for downloading the bytes behind a photo locator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageFetchPort: Send + Sync {
    /// Performs one GET for `request`, sending its headers.
    /// Non-success statuses are errors.
    async fn fetch(&self, request: &RequestIdentity) -> Result<FetchedResponse, PhotoError>;
}
