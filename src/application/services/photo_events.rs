//! Completion notifications for photo loads.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::entities::Photo;
use crate::domain::errors::PhotoError;

/// Well-known name carried by every photo completion event.
pub const PHOTO_LOADING_DID_END: &str = "photo-loading-did-end";

/// Default number of events buffered per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// How a load attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The photo now holds the downloaded image.
    Loaded,
    /// The photo was left untouched.
    Failed(PhotoError),
}

/// Posted once per load attempt, after any state change it made.
#[derive(Debug, Clone)]
pub struct PhotoLoadingDidEnd {
    /// The photo the load was started for.
    pub photo: Arc<Photo>,
    /// Whether the load produced an image.
    pub outcome: LoadOutcome,
}

impl PhotoLoadingDidEnd {
    /// Returns [`PHOTO_LOADING_DID_END`].
    #[must_use]
    pub const fn name(&self) -> &'static str {
        PHOTO_LOADING_DID_END
    }

    /// Returns true if the load produced an image.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self.outcome, LoadOutcome::Loaded)
    }

    /// Returns true if this event is about `photo`.
    #[must_use]
    pub fn is_for(&self, photo: &Arc<Photo>) -> bool {
        Arc::ptr_eq(&self.photo, photo)
    }
}

/// Broadcast channel for [`PhotoLoadingDidEnd`] events.
///
/// Any number of subscribers may come and go; each receives every event
/// posted while it is subscribed.
#[derive(Debug, Clone)]
pub struct PhotoEventBus {
    tx: broadcast::Sender<PhotoLoadingDidEnd>,
}

impl PhotoEventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribes to future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PhotoLoadingDidEnd> {
        self.tx.subscribe()
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Posts an event. Returns how many subscribers will see it.
    pub fn post(&self, event: PhotoLoadingDidEnd) -> usize {
        match self.tx.send(event) {
            Ok(count) => count,
            Err(_) => {
                trace!(name = PHOTO_LOADING_DID_END, "No subscribers for photo event");
                0
            }
        }
    }
}

impl Default for PhotoEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(outcome: LoadOutcome) -> PhotoLoadingDidEnd {
        PhotoLoadingDidEnd {
            photo: Photo::from_url("https://x/img.png", None).into_shared(),
            outcome,
        }
    }

    #[test]
    fn test_every_subscriber_receives_event() {
        let bus = PhotoEventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        assert_eq!(bus.post(event(LoadOutcome::Loaded)), 2);

        let a = first.try_recv().unwrap();
        let b = second.try_recv().unwrap();
        assert!(Arc::ptr_eq(&a.photo, &b.photo));
        assert_eq!(a.name(), PHOTO_LOADING_DID_END);
    }

    #[test]
    fn test_post_without_subscribers() {
        let bus = PhotoEventBus::default();
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.post(event(LoadOutcome::Loaded)), 0);
    }

    #[test]
    fn test_unsubscribe_by_dropping_receiver() {
        let bus = PhotoEventBus::default();
        let rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(rx);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_outcome_helpers() {
        let loaded = event(LoadOutcome::Loaded);
        let failed = event(LoadOutcome::Failed(PhotoError::network("offline")));

        assert!(loaded.is_loaded());
        assert!(!failed.is_loaded());
        assert!(loaded.is_for(&loaded.photo));
        assert!(!loaded.is_for(&failed.photo));
    }
}
