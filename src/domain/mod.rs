//! Domain layer with core photo entities and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{Photo, PhotoImage, RequestIdentity};
pub use errors::PhotoError;
pub use ports::{ImageCache, ImageFetchPort};
