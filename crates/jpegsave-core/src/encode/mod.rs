//! JPEG encoding for the save pipeline.
//!
//! This module provides:
//! - The [`JpegEncode`] seam the pipeline calls exactly once per save
//! - [`ImageJpegEncoder`], the default implementation
//! - [`encode_jpeg`] for encoding raw 8-bit buffers directly
//!
//! # Examples
//!
//! ```ignore
//! use jpegsave_core::encode::encode_jpeg;
//! use jpegsave_core::{BandLayout, Quality};
//!
//! let pixels = vec![128u8; 100 * 100 * 3]; // Gray image
//! let jpeg_bytes =
//!     encode_jpeg(&pixels, 100, 100, BandLayout::Rgb, Quality::DEFAULT, None, None).unwrap();
//! println!("Encoded {} bytes", jpeg_bytes.len());
//! ```

mod jpeg;

pub use jpeg::{encode_jpeg, EncodeError, ImageJpegEncoder, JpegEncode, MAX_EXIF_LEN};
