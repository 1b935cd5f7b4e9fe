//! Photo gallery - lazy, cached photo resources.
//!
//! A [`domain::entities::Photo`] holds an in-memory image, a remote locator,
//! or both. [`application::services::PhotoLoader`] consults the process-wide
//! [`infrastructure::image::ImageCacheGateway`] before touching the network,
//! loads missing images in the background and announces every completed load
//! exactly once on a [`application::services::PhotoEventBus`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the loader, main context and events.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing caches, transport and configuration.
pub mod infrastructure;
/// Presentation layer containing the gallery driver.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "photo-gallery";
