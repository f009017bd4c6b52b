//! JPEG encoding.
//!
//! Monochrome and RGB images go through the `image` crate's JPEG encoder.
//! That encoder has no CMYK input, so four-band images use the `jpeg-encoder`
//! crate instead. Both attach the ICC profile as `ICC_PROFILE` APP2 segments
//! and EXIF as one APP1 segment; neither ever changes pixel values.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use std::io::Cursor;
use thiserror::Error;

use crate::format::{BandLayout, NormalizedImage};
use crate::options::Quality;
use crate::profile::ResolvedProfile;

/// Largest EXIF payload that fits in one APP1 segment after its `Exif\0\0`
/// header.
pub const MAX_EXIF_LEN: usize = 65_533 - EXIF_HEADER.len();

const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Errors that can occur during JPEG encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * bands), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero or too large for a JPEG frame
    #[error("Invalid dimensions: {width}x{height} (JPEG frames are 1 to 65535 pixels per side)")]
    InvalidDimensions { width: u32, height: u32 },

    /// The encoder refused the ICC profile
    #[error("Unable to embed ICC profile: {0}")]
    ProfileRejected(String),

    /// EXIF data too large for a single APP1 segment
    #[error("EXIF data is {0} bytes, at most {max} fit in a JPEG", max = MAX_EXIF_LEN)]
    ExifTooLarge(usize),

    /// The encoder returned no bytes
    #[error("JPEG encoder produced no output")]
    EmptyOutput,

    /// JPEG encoding failed
    #[error("JPEG encoding failed: {0}")]
    EncodingFailed(String),
}

/// The external JPEG encoder.
///
/// Functions and closures with the same shape implement this trait, so callers
/// can substitute their own encoder.
pub trait JpegEncode {
    fn encode(
        &self,
        image: &NormalizedImage<'_>,
        quality: Quality,
        profile: &ResolvedProfile,
    ) -> Result<Vec<u8>, EncodeError>;
}

impl<F> JpegEncode for F
where
    F: Fn(&NormalizedImage<'_>, Quality, &ResolvedProfile) -> Result<Vec<u8>, EncodeError>,
{
    fn encode(
        &self,
        image: &NormalizedImage<'_>,
        quality: Quality,
        profile: &ResolvedProfile,
    ) -> Result<Vec<u8>, EncodeError> {
        self(image, quality, profile)
    }
}

/// Default encoder backed by the `image` and `jpeg-encoder` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageJpegEncoder;

impl JpegEncode for ImageJpegEncoder {
    fn encode(
        &self,
        image: &NormalizedImage<'_>,
        quality: Quality,
        profile: &ResolvedProfile,
    ) -> Result<Vec<u8>, EncodeError> {
        encode_jpeg(
            &image.pixels,
            image.width,
            image.height,
            image.layout,
            quality,
            profile.as_bytes(),
            image.exif,
        )
    }
}

/// Encode 8-bit pixel data to JPEG bytes.
///
/// # Arguments
///
/// * `pixels` - Band-interleaved pixel data, row-major order
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `layout` - Mono, RGB or CMYK
/// * `quality` - JPEG quality
/// * `icc` - ICC profile to embed, if any
/// * `exif` - Raw EXIF (TIFF-structured) data to embed, if any
///
/// # Quality Guidelines
///
/// * 90-100: High quality, suitable for archival or further editing
/// * 75: Default, a good balance for most uses
/// * 60-80: Medium quality, acceptable for web/social media
/// * Below 60: Low quality, visible artifacts
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    layout: BandLayout,
    quality: Quality,
    icc: Option<&[u8]>,
    exif: Option<&[u8]>,
) -> Result<Vec<u8>, EncodeError> {
    // Validate dimensions
    if width == 0 || height == 0 || width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    // Validate pixel data length
    let expected_len = (width as usize) * (height as usize) * layout.bands();
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    let exif = exif.filter(|exif| !exif.is_empty());
    if let Some(exif) = exif {
        if exif.len() > MAX_EXIF_LEN {
            return Err(EncodeError::ExifTooLarge(exif.len()));
        }
    }

    match layout {
        BandLayout::Mono => encode_with_image(
            pixels,
            (width, height),
            ExtendedColorType::L8,
            quality,
            icc,
            exif,
        ),
        BandLayout::Rgb => encode_with_image(
            pixels,
            (width, height),
            ExtendedColorType::Rgb8,
            quality,
            icc,
            exif,
        ),
        BandLayout::Cmyk => {
            encode_cmyk(pixels, (width as u16, height as u16), quality, icc, exif)
        }
    }
}

fn encode_with_image(
    pixels: &[u8],
    (width, height): (u32, u32),
    color_type: ExtendedColorType,
    quality: Quality,
    icc: Option<&[u8]>,
    exif: Option<&[u8]>,
) -> Result<Vec<u8>, EncodeError> {
    // Create output buffer
    let mut buffer = Cursor::new(Vec::new());

    // Create JPEG encoder with specified quality
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.get());

    if let Some(icc) = icc {
        encoder
            .set_icc_profile(icc.to_vec())
            .map_err(|e| EncodeError::ProfileRejected(e.to_string()))?;
    }

    if let Some(exif) = exif {
        // The encoder prepends the `Exif\0\0` header itself
        encoder
            .set_exif_metadata(exif.to_vec())
            .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
    }

    // Encode the image
    encoder
        .write_image(pixels, width, height, color_type)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

fn encode_cmyk(
    pixels: &[u8],
    (width, height): (u16, u16),
    quality: Quality,
    icc: Option<&[u8]>,
    exif: Option<&[u8]>,
) -> Result<Vec<u8>, EncodeError> {
    let mut buffer = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut buffer, quality.get());

    if let Some(exif) = exif {
        let mut segment = Vec::with_capacity(EXIF_HEADER.len() + exif.len());
        segment.extend_from_slice(EXIF_HEADER);
        segment.extend_from_slice(exif);
        encoder
            .add_app_segment(1, &segment)
            .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
    }

    if let Some(icc) = icc {
        encoder
            .add_icc_profile(icc)
            .map_err(|e| EncodeError::ProfileRejected(e.to_string()))?;
    }

    encoder
        .encode(pixels, width, height, jpeg_encoder::ColorType::Cmyk)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
