//! The image handed to the save stage.
//!
//! A [`SourceImage`] is the output of whatever pipeline computed the pixels:
//! typed, band-interleaved samples plus named metadata blobs. The save stage
//! only reads it. [`load_image`] builds one from a file on disk for the
//! command-line front end.

mod load;
mod types;

pub use load::{load_image, LoadError};
pub use types::{
    ImageMetadata, SampleFormat, Samples, SourceImage, EXIF_FIELD, ICC_PROFILE_FIELD,
};
