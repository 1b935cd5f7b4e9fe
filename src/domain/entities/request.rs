//! Request and response identities used by the request-level image cache.

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::image::PhotoHeaders;
use crate::domain::errors::PhotoError;

/// The method every photo fetch uses.
pub const GET: &str = "GET";

/// Method, URL and headers of an outbound image request.
///
/// Header names are stored lowercased so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestIdentity {
    method: String,
    url: String,
    headers: PhotoHeaders,
}

impl RequestIdentity {
    /// Builds a header-less GET identity for a locator.
    ///
    /// # Errors
    /// Returns [`PhotoError::InvalidLocator`] if the locator is not an absolute URL.
    pub fn get(locator: &str) -> Result<Self, PhotoError> {
        let url = Url::parse(locator).map_err(|e| PhotoError::invalid_locator(locator, e))?;
        Ok(Self {
            method: GET.to_string(),
            url: url.into(),
            headers: PhotoHeaders::new(),
        })
    }

    /// Attaches request headers.
    #[must_use]
    pub fn with_headers(mut self, headers: &PhotoHeaders) -> Self {
        self.headers.extend(
            headers
                .iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value.clone())),
        );
        self
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the normalized URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the request headers.
    #[must_use]
    pub const fn headers(&self) -> &PhotoHeaders {
        &self.headers
    }

    /// Returns a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Key under which responses to this request are stored.
    /// Headers are not part of the key; `Vary` decides whether they matter.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

impl std::fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Status line and headers of a response, as kept alongside cached bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// HTTP status code.
    pub status: u16,
    /// Final URL after redirects.
    pub url: String,
    /// Response headers with lowercased names.
    pub headers: BTreeMap<String, String>,
    /// When the response was received.
    pub received_at: DateTime<Utc>,
}

impl ResponseMetadata {
    /// Creates metadata received now with no headers.
    #[must_use]
    pub fn new(status: u16, url: impl Into<String>) -> Self {
        Self {
            status,
            url: url.into(),
            headers: BTreeMap::new(),
            received_at: Utc::now(),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Overrides the receive time.
    #[must_use]
    pub const fn received_at(mut self, at: DateTime<Utc>) -> Self {
        self.received_at = at;
        self
    }

    /// Returns a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// A completed fetch: what was asked, what came back, and the body.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// The request as sent.
    pub request: RequestIdentity,
    /// Response status and headers.
    pub metadata: ResponseMetadata,
    /// Raw body bytes.
    pub body: Bytes,
}
