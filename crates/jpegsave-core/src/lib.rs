//! jpegsave Core - the "save to JPEG" stage of an image pipeline
//!
//! This crate takes a fully computed in-memory image and writes it as JPEG to
//! one of three destinations: a file, a caller-owned buffer, or a MIME
//! response on standard output.
//!
//! All three share one pipeline: validate the quality factor, cast the pixels
//! to 8-bit mono/RGB/CMYK, resolve the ICC profile and EXIF data to embed,
//! call the encoder once, then hand the bytes to the chosen sink.
//!
//! # Examples
//!
//! ```ignore
//! use jpegsave_core::{save_to_buffer, SaveOptions, Samples, SourceImage};
//!
//! let image = SourceImage::new(100, 100, 3, Samples::U8(vec![128; 100 * 100 * 3]))?;
//! let options = SaveOptions::builder().quality(90).profile("none").build();
//! let jpeg = save_to_buffer(&image, &options)?;
//! println!("Encoded {} bytes", jpeg.len());
//! ```

pub mod encode;
pub mod error;
pub mod format;
pub mod options;
pub mod profile;
pub mod save;
pub mod sink;
pub mod source;

pub use encode::{EncodeError, ImageJpegEncoder, JpegEncode};
pub use error::{ErrorKind, SaveError};
pub use format::{normalize, BandLayout, NormalizedImage};
pub use options::{ProfileDirective, Quality, SaveOptions, SaveOptionsBuilder, NO_PROFILE};
pub use profile::{resolve_exif, resolve_profile, ResolvedProfile};
pub use save::{
    save_to_buffer, save_to_file, save_to_stream, save_to_writer, EncodedSave, SaveRequest,
    ValidatedSave,
};
pub use sink::{Delivered, EncodedPayload, JpegBuffer, Sink};
pub use source::{
    load_image, ImageMetadata, LoadError, SampleFormat, Samples, SourceImage, EXIF_FIELD,
    ICC_PROFILE_FIELD,
};
