//! A single photo shown by a gallery.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use super::image::{DisplayMode, PhotoHeaders, PhotoImage};
use super::request::RequestIdentity;

/// One photo: a decoded image, a remote locator, or both.
///
/// The image only ever goes from absent to present (or is replaced by a newer
/// one); nothing here clears it. Photos are shared as `Arc<Photo>` so that
/// completion events can point back at the instance that finished loading.
pub struct Photo {
    image: RwLock<Option<PhotoImage>>,
    url: Option<String>,
    headers: Option<PhotoHeaders>,
    display_mode: DisplayMode,
    caching_enabled: bool,
    caption: Option<String>,
    index: AtomicUsize,
}

impl Photo {
    fn empty() -> Self {
        Self {
            image: RwLock::new(None),
            url: None,
            headers: None,
            display_mode: DisplayMode::default(),
            caching_enabled: false,
            caption: None,
            index: AtomicUsize::new(0),
        }
    }

    /// Creates a photo from an already decoded image.
    #[must_use]
    pub fn from_image(image: PhotoImage) -> Self {
        let photo = Self::empty();
        *photo.image.write() = Some(image);
        photo
    }

    /// Creates a photo backed by a remote URL.
    #[must_use]
    pub fn from_url(url: impl Into<String>, headers: Option<PhotoHeaders>) -> Self {
        Self {
            url: Some(url.into()),
            headers,
            ..Self::empty()
        }
    }

    /// Creates a URL-backed photo that shows `holder` until the real image arrives.
    #[must_use]
    pub fn from_url_with_holder(
        url: impl Into<String>,
        headers: Option<PhotoHeaders>,
        holder: Option<PhotoImage>,
    ) -> Self {
        let photo = Self::from_url(url, headers);
        *photo.image.write() = holder;
        photo
    }

    /// Sets the caption.
    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Sets the display mode.
    #[must_use]
    pub const fn with_display_mode(mut self, mode: DisplayMode) -> Self {
        self.display_mode = mode;
        self
    }

    /// Enables or disables reading and writing the image cache for this photo.
    #[must_use]
    pub const fn with_caching(mut self, enabled: bool) -> Self {
        self.caching_enabled = enabled;
        self
    }

    /// Wraps the photo for sharing with loaders and subscribers.
    #[must_use]
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Returns the current image (holder or final), if any.
    #[must_use]
    pub fn image(&self) -> Option<PhotoImage> {
        self.image.read().clone()
    }

    /// Returns true once an image is present.
    #[must_use]
    pub fn has_image(&self) -> bool {
        self.image.read().is_some()
    }

    pub(crate) fn set_image(&self, image: PhotoImage) {
        *self.image.write() = Some(image);
    }

    /// Returns the remote locator.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Returns the headers attached to fetches.
    #[must_use]
    pub const fn headers(&self) -> Option<&PhotoHeaders> {
        self.headers.as_ref()
    }

    /// Returns the display mode.
    #[must_use]
    pub const fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    /// Returns true if this photo reads and writes the image cache.
    #[must_use]
    pub const fn is_caching_enabled(&self) -> bool {
        self.caching_enabled
    }

    /// Returns the caption.
    #[must_use]
    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    /// Returns the position assigned by the owning gallery.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index.load(Ordering::Relaxed)
    }

    /// Moves the photo to a new position. Called by the owning gallery.
    pub fn set_index(&self, index: usize) {
        self.index.store(index, Ordering::Relaxed);
    }

    /// The request sent to fetch this photo, headers included.
    /// `None` if there is no locator or it does not parse.
    #[must_use]
    pub fn fetch_request(&self) -> Option<RequestIdentity> {
        let request = RequestIdentity::get(self.url.as_deref()?).ok()?;
        Some(match &self.headers {
            Some(headers) => request.with_headers(headers),
            None => request,
        })
    }

    /// The header-less request used to look the photo up in a request-level cache.
    #[must_use]
    pub fn lookup_request(&self) -> Option<RequestIdentity> {
        RequestIdentity::get(self.url.as_deref()?).ok()
    }
}

impl std::fmt::Debug for Photo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Photo")
            .field("url", &self.url)
            .field("has_image", &self.has_image())
            .field("caching_enabled", &self.caching_enabled)
            .field("caption", &self.caption)
            .field("index", &self.index())
            .finish_non_exhaustive()
    }
}
