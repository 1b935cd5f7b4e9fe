mod image;
mod photo;
mod request;

pub use image::{DisplayMode, PhotoHeaders, PhotoImage, decode_image};
pub use photo::Photo;
pub use request::{FetchedResponse, GET, RequestIdentity, ResponseMetadata};
