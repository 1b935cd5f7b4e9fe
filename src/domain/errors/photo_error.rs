//! Photo loading error types.

use thiserror::Error;

/// Why a photo load did not produce an image.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum PhotoError {
    #[error("invalid photo locator {locator:?}: {reason}")]
    InvalidLocator { locator: String, reason: String },

    #[error("network error while fetching photo: {message}")]
    Network { message: String },

    #[error("failed to decode photo: {message}")]
    Decode { message: String },

    #[error("photo load interrupted: {message}")]
    Interrupted { message: String },
}

impl PhotoError {
    /// Creates invalid locator error.
    #[must_use]
    pub fn invalid_locator(locator: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidLocator {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates interrupted error.
    #[must_use]
    pub fn interrupted(message: impl Into<String>) -> Self {
        Self::Interrupted {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for PhotoError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::network("request timed out")
        } else if e.is_connect() {
            Self::network(format!("failed to connect: {e}"))
        } else {
            Self::network(e.to_string())
        }
    }
}

impl From<image::ImageError> for PhotoError {
    fn from(e: image::ImageError) -> Self {
        Self::decode(e.to_string())
    }
}
