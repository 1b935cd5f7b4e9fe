//! The photo collection the command-line driver browses.

use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};

use crate::application::services::{LoadOutcome, MainContext, PhotoLoader, PhotoLoadingDidEnd};
use crate::domain::entities::Photo;

/// Where a photo's image came from after [`Gallery::load_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoStatus {
    /// Built from an in-memory image.
    Local,
    /// Served from the image cache.
    Cached,
    /// Downloaded.
    Loaded,
    /// The download failed.
    Failed(String),
    /// The locator could not be loaded.
    Skipped,
}

/// Summary of one photo after loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoReport {
    /// Position in the gallery.
    pub index: usize,
    /// Locator, if any.
    pub url: Option<String>,
    /// Caption, if any.
    pub caption: Option<String>,
    /// How loading ended.
    pub status: PhotoStatus,
    /// Width and height of the held image.
    pub dimensions: Option<(u32, u32)>,
}

impl PhotoReport {
    fn new(photo: &Photo, status: PhotoStatus) -> Self {
        Self {
            index: photo.index(),
            url: photo.url().map(str::to_owned),
            caption: photo.caption().map(str::to_owned),
            status,
            dimensions: photo.image().map(|image| (image.width(), image.height())),
        }
    }
}

impl fmt::Display for PhotoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.index, self.url.as_deref().unwrap_or("<local>"))?;
        match &self.status {
            PhotoStatus::Local => write!(f, ": local")?,
            PhotoStatus::Cached => write!(f, ": cached")?,
            PhotoStatus::Loaded => write!(f, ": loaded")?,
            PhotoStatus::Failed(reason) => write!(f, ": failed ({reason})")?,
            PhotoStatus::Skipped => write!(f, ": skipped")?,
        }
        if let Some((width, height)) = self.dimensions {
            write!(f, " {width}x{height}")?;
        }
        if let Some(caption) = &self.caption {
            write!(f, " \"{caption}\"")?;
        }
        Ok(())
    }
}

/// Owns an ordered set of photos and drives their loading.
///
/// The gallery is the owner of the [`MainContext`]: completions are applied
/// only while [`Gallery::load_all`] is pumping it.
pub struct Gallery {
    photos: Vec<Arc<Photo>>,
    loader: PhotoLoader,
    main: MainContext,
    events: broadcast::Receiver<PhotoLoadingDidEnd>,
}

impl Gallery {
    /// Creates an empty gallery. `main` must be the context `loader` dispatches to.
    #[must_use]
    pub fn new(loader: PhotoLoader, main: MainContext) -> Self {
        let events = loader.events().subscribe();
        Self {
            photos: Vec::new(),
            loader,
            main,
            events,
        }
    }

    /// Appends a photo and assigns its index.
    pub fn push(&mut self, photo: Photo) -> Arc<Photo> {
        let photo = photo.into_shared();
        photo.set_index(self.photos.len());
        self.photos.push(Arc::clone(&photo));
        photo
    }

    /// Removes the photo at `index`, renumbering the ones after it.
    pub fn remove(&mut self, index: usize) -> Option<Arc<Photo>> {
        if index >= self.photos.len() {
            return None;
        }
        let removed = self.photos.remove(index);
        for (position, photo) in self.photos.iter().enumerate().skip(index) {
            photo.set_index(position);
        }
        Some(removed)
    }

    /// Returns the photos in order.
    #[must_use]
    pub fn photos(&self) -> &[Arc<Photo>] {
        &self.photos
    }

    /// Returns the number of photos.
    #[must_use]
    pub fn len(&self) -> usize {
        self.photos.len()
    }

    /// Returns true if the gallery holds no photos.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Consults the cache for every photo, loads the rest and waits for all
    /// completions. Returns one report per photo, in gallery order.
    pub async fn load_all(&mut self) -> Vec<PhotoReport> {
        let mut statuses: Vec<Option<PhotoStatus>> = vec![None; self.photos.len()];
        let mut pending = 0_usize;

        for (slot, photo) in statuses.iter_mut().zip(&self.photos) {
            if photo.url().is_none() {
                *slot = Some(PhotoStatus::Local);
            } else if self.loader.check_cache(photo) {
                *slot = Some(PhotoStatus::Cached);
            } else if self.loader.load_underlying_image_and_notify(photo) {
                pending += 1;
            } else {
                *slot = Some(PhotoStatus::Skipped);
            }
        }

        debug!(photos = self.photos.len(), pending, "Waiting for photo loads");

        while pending > 0 {
            if !self.main.turn().await {
                warn!(pending, "Main context closed with loads outstanding");
                break;
            }
            loop {
                match self.events.try_recv() {
                    Ok(event) => {
                        let Some(position) = self.photos.iter().position(|p| event.is_for(p))
                        else {
                            continue;
                        };
                        statuses[position] = Some(match event.outcome {
                            LoadOutcome::Loaded => PhotoStatus::Loaded,
                            LoadOutcome::Failed(e) => PhotoStatus::Failed(e.to_string()),
                        });
                        pending = pending.saturating_sub(1);
                    }
                    Err(TryRecvError::Lagged(missed)) => {
                        warn!(missed, "Photo events dropped");
                        pending = pending.saturating_sub(usize::try_from(missed).unwrap_or(pending));
                    }
                    Err(_) => break,
                }
            }
        }

        self.photos
            .iter()
            .zip(statuses)
            .map(|(photo, status)| {
                let status = status.unwrap_or_else(|| {
                    if photo.has_image() {
                        PhotoStatus::Loaded
                    } else {
                        PhotoStatus::Failed("no completion received".to_string())
                    }
                });
                PhotoReport::new(photo, status)
            })
            .collect()
    }
}

impl fmt::Debug for Gallery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gallery")
            .field("photos", &self.photos.len())
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}
