//! Photo loading services.

mod main_context;
mod photo_events;
mod photo_loader;

pub use main_context::{MainContext, MainContextHandle};
pub use photo_events::{
    DEFAULT_EVENT_CAPACITY, LoadOutcome, PHOTO_LOADING_DID_END, PhotoEventBus, PhotoLoadingDidEnd,
};
pub use photo_loader::PhotoLoader;
