//! Cache lookup and background loading for photos.

use std::sync::{Arc, Weak};

use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use super::main_context::MainContextHandle;
use super::photo_events::{LoadOutcome, PhotoEventBus, PhotoLoadingDidEnd};
use crate::domain::entities::{FetchedResponse, Photo, PhotoImage, RequestIdentity, decode_image};
use crate::domain::errors::PhotoError;
use crate::domain::ports::ImageFetchPort;
use crate::infrastructure::image::{HttpImageFetcher, ImageCacheGateway};

/// Checks the image cache for photos and loads missing images in the background.
///
/// Loads are fire-and-forget tokio tasks. Their results are applied to the
/// photo and announced on the [`PhotoEventBus`] from the main context, never
/// from the task itself. Overlapping loads of one photo are not merged: each
/// call fetches on its own and the last completion to reach the main context
/// decides the image.
#[derive(Clone)]
pub struct PhotoLoader {
    cache: Arc<ImageCacheGateway>,
    fetcher: Arc<dyn ImageFetchPort>,
    main: MainContextHandle,
    events: PhotoEventBus,
    runtime: Handle,
}

impl PhotoLoader {
    /// Creates a loader using the shared cache gateway and an HTTP fetcher.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn new(main: MainContextHandle, events: PhotoEventBus) -> Self {
        Self {
            cache: ImageCacheGateway::shared(),
            fetcher: Arc::new(HttpImageFetcher::default()),
            main,
            events,
            runtime: Handle::current(),
        }
    }

    /// Uses `cache` instead of the shared gateway.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<ImageCacheGateway>) -> Self {
        self.cache = cache;
        self
    }

    /// Uses `fetcher` for downloads.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn ImageFetchPort>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Returns the cache gateway in use.
    #[must_use]
    pub const fn cache(&self) -> &Arc<ImageCacheGateway> {
        &self.cache
    }

    /// Returns the event bus completions are posted to.
    #[must_use]
    pub const fn events(&self) -> &PhotoEventBus {
        &self.events
    }

    /// Applies a cached image to `photo`, if there is one.
    ///
    /// Does nothing unless the photo has a locator and caching enabled. A miss
    /// leaves the photo unchanged. Returns true on a hit.
    pub fn check_cache(&self, photo: &Photo) -> bool {
        let Some(url) = photo.url() else {
            return false;
        };
        if !photo.is_caching_enabled() {
            return false;
        }

        let cached = if self.cache.supports_request_lookup() {
            let Some(request) = photo.lookup_request() else {
                trace!(url, "Locator cannot form a cache request");
                return false;
            };
            self.cache.image_for_request(&request)
        } else {
            self.cache.image_for_key(url)
        };

        match cached {
            Some(image) => {
                debug!(url, "Photo served from cache");
                photo.set_image(image);
                true
            }
            None => false,
        }
    }

    /// Starts one background fetch of `photo`'s locator.
    ///
    /// Returns false without doing anything if the photo has no locator or the
    /// locator is not a URL; no event is posted in that case. Otherwise exactly
    /// one [`PhotoLoadingDidEnd`] follows on the main context, after the image
    /// (on success) has been applied and cached.
    ///
    /// The task only holds a weak reference: if every `Arc<Photo>` is dropped
    /// before it finishes, the result is discarded silently.
    pub fn load_underlying_image_and_notify(&self, photo: &Arc<Photo>) -> bool {
        let Some(request) = photo.fetch_request() else {
            trace!(url = ?photo.url(), "Photo has no loadable locator");
            return false;
        };

        let cache_key = photo
            .is_caching_enabled()
            .then(|| photo.url().map(str::to_owned))
            .flatten();
        let mut completion = Completion {
            target: Some(Arc::downgrade(photo)),
            main: self.main.clone(),
            events: self.events.clone(),
        };
        let loader = self.clone();

        self.runtime.spawn(async move {
            let result = fetch_and_decode(loader.fetcher.as_ref(), &request).await;

            let result = match result {
                Ok((image, response)) => {
                    if let Some(key) = cache_key {
                        let cache = Arc::clone(&loader.cache);
                        let cached = image.clone();
                        let stored = tokio::task::spawn_blocking(move || {
                            populate_cache(&cache, &key, cached, response);
                        })
                        .await;
                        if let Err(e) = stored {
                            warn!(request = %request, error = %e, "Cache store task failed");
                        }
                    }
                    Ok(image)
                }
                Err(e) => {
                    debug!(request = %request, error = %e, "Photo load failed");
                    Err(e)
                }
            };

            completion.finish(result);
        });

        true
    }
}

impl std::fmt::Debug for PhotoLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoLoader")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Delivers the single completion of one load to the main context.
///
/// Dropped without [`Completion::finish`] (the task panicked or was
/// cancelled), it reports the load as interrupted instead.
struct Completion {
    target: Option<Weak<Photo>>,
    main: MainContextHandle,
    events: PhotoEventBus,
}

impl Completion {
    fn finish(&mut self, result: Result<PhotoImage, PhotoError>) {
        let Some(target) = self.target.take() else {
            return;
        };
        let events = self.events.clone();
        self.main.dispatch(move || {
            let Some(photo) = target.upgrade() else {
                trace!("Photo released before its load finished");
                return;
            };
            let outcome = match result {
                Ok(image) => {
                    photo.set_image(image);
                    LoadOutcome::Loaded
                }
                Err(e) => LoadOutcome::Failed(e),
            };
            events.post(PhotoLoadingDidEnd { photo, outcome });
        });
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if self.target.is_some() {
            warn!("Photo load task ended without a result");
            self.finish(Err(PhotoError::interrupted("load task ended early")));
        }
    }
}

/// Stores a fetched photo in whichever shape the installed cache takes.
/// May touch the disk, so it runs off the async workers.
fn populate_cache(
    cache: &ImageCacheGateway,
    key: &str,
    image: PhotoImage,
    response: FetchedResponse,
) {
    if cache.supports_request_lookup() {
        cache.set_image_data(response.body, &response.metadata, &response.request);
    } else {
        cache.set_image(image, key);
    }
}

async fn fetch_and_decode(
    fetcher: &dyn ImageFetchPort,
    request: &RequestIdentity,
) -> Result<(PhotoImage, FetchedResponse), PhotoError> {
    let response = fetcher.fetch(request).await?;
    let body = response.body.clone();
    let image = tokio::task::spawn_blocking(move || decode_image(&body))
        .await
        .map_err(|e| PhotoError::decode(format!("decode task panicked: {e}")))??;
    Ok((image, response))
}
