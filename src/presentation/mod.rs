//! Presentation layer: the gallery the command-line driver reports on.

/// Photo collection and load reporting.
pub mod gallery;

pub use gallery::{Gallery, PhotoReport, PhotoStatus};
