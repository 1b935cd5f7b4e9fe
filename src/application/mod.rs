//! Application layer coordinating photos, caches and the main context.

/// Service implementations.
pub mod services;

pub use services::{
    LoadOutcome, MainContext, MainContextHandle, PHOTO_LOADING_DID_END, PhotoEventBus,
    PhotoLoader, PhotoLoadingDidEnd,
};
