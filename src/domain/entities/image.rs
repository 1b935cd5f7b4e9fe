//! Domain types for decoded images and how they are presented.

use std::collections::BTreeMap;
use std::sync::Arc;

/// A decoded image shared between photos, caches and the UI.
pub type PhotoImage = Arc<image::DynamicImage>;

/// Extra request headers attached to a photo's outbound fetch.
/// Ordered so that equal header sets compare and hash identically.
pub type PhotoHeaders = BTreeMap<String, String>;

/// How the consumer should fit the image into its viewport.
/// Carried through untouched; nothing in this crate interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Stretch to fill, ignoring aspect ratio.
    ScaleToFill,
    /// Fit inside the viewport, keeping aspect ratio.
    ScaleAspectFit,
    /// Fill the viewport, keeping aspect ratio and cropping overflow.
    #[default]
    ScaleAspectFill,
    /// Draw at natural size, centered.
    Center,
}

/// Decodes raw bytes into a shared image.
///
/// # Errors
/// Returns the decoder error if the bytes are not a supported image format.
pub fn decode_image(bytes: &[u8]) -> Result<PhotoImage, image::ImageError> {
    image::load_from_memory(bytes).map(Arc::new)
}
