//! HTTP caching rules for request-level image caches.
//!
//! Only the subset needed for image responses: `Cache-Control` (`no-store`,
//! `no-cache`, `max-age`) and `Vary`. There is no revalidation, so anything
//! that would need one is treated as a miss.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{RequestIdentity, ResponseMetadata};

/// Parsed `Cache-Control` response directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheControl {
    /// `no-store`: never keep the response.
    pub no_store: bool,
    /// `no-cache`: must revalidate before reuse.
    pub no_cache: bool,
    /// `max-age` in seconds.
    pub max_age: Option<u64>,
}

impl CacheControl {
    /// Parses a `Cache-Control` header value. Unknown directives are ignored.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let mut control = Self::default();
        for directive in value.split(',') {
            let directive = directive.trim().to_ascii_lowercase();
            match directive.split_once('=') {
                Some(("max-age", secs)) => {
                    control.max_age = secs.trim().trim_matches('"').parse().ok();
                }
                Some(_) => {}
                None if directive == "no-store" => control.no_store = true,
                None if directive == "no-cache" => control.no_cache = true,
                None => {}
            }
        }
        control
    }

    /// Reads the directives from response metadata.
    #[must_use]
    pub fn from_response(response: &ResponseMetadata) -> Self {
        response
            .header("cache-control")
            .map(Self::parse)
            .unwrap_or_default()
    }
}

/// Request and response metadata stored next to a cached body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// The request that produced the response.
    pub request: RequestIdentity,
    /// The response status and headers.
    pub response: ResponseMetadata,
}

impl CachedResponse {
    /// Builds a record if the response may be stored at all.
    #[must_use]
    pub fn storable(request: &RequestIdentity, response: &ResponseMetadata) -> Option<Self> {
        if !response.is_success() || CacheControl::from_response(response).no_store {
            return None;
        }
        Some(Self {
            request: request.clone(),
            response: response.clone(),
        })
    }

    /// When the record stops being fresh. `None` means no expiry.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let max_age = CacheControl::from_response(&self.response).max_age?;
        let secs = i64::try_from(max_age).unwrap_or(i64::MAX);
        Some(
            self.response
                .received_at
                .checked_add_signed(Duration::try_seconds(secs).unwrap_or(Duration::MAX))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        )
    }

    /// Returns true if the record can be served at `now` without revalidation.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        if CacheControl::from_response(&self.response).no_cache {
            return false;
        }
        self.expires_at().is_none_or(|expires| now < expires)
    }

    /// Returns true if `request` may be answered by this record.
    #[must_use]
    pub fn matches(&self, request: &RequestIdentity) -> bool {
        if self.request.cache_key() != request.cache_key() {
            return false;
        }
        let Some(vary) = self.response.header("vary") else {
            return true;
        };
        vary.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .all(|name| name != "*" && self.request.header(name) == request.header(name))
    }

    /// Returns true if the record answers `request` at `now`.
    #[must_use]
    pub fn serves(&self, request: &RequestIdentity, now: DateTime<Utc>) -> bool {
        self.matches(request) && self.is_fresh(now)
    }
}
