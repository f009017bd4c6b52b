//! Pixel format normalisation for JPEG.
//!
//! JPEG stores 8-bit unsigned samples in one of three band layouts. Every
//! source sample format is cast to u8 (integers clipped to 0-255, floats
//! rounded then clipped) and the band count is checked against the saveable
//! layouts before any encoding is attempted.

use std::borrow::Cow;

use tracing::debug;

use crate::profile::resolve_exif;
use crate::source::{Samples, SourceImage};
use crate::SaveError;

/// Band layouts JPEG can store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BandLayout {
    /// Single band, monochrome
    Mono,
    /// Three bands, RGB
    Rgb,
    /// Four bands, CMYK
    Cmyk,
}

impl BandLayout {
    /// Map a band count to its saveable layout.
    ///
    /// # Errors
    ///
    /// Returns `SaveError::UnsupportedBands` for anything but 1, 3 or 4 bands.
    pub fn from_bands(bands: u32) -> Result<Self, SaveError> {
        match bands {
            1 => Ok(BandLayout::Mono),
            3 => Ok(BandLayout::Rgb),
            4 => Ok(BandLayout::Cmyk),
            other => Err(SaveError::UnsupportedBands(other)),
        }
    }

    pub fn bands(self) -> usize {
        match self {
            BandLayout::Mono => 1,
            BandLayout::Rgb => 3,
            BandLayout::Cmyk => 4,
        }
    }
}

/// An image in the single format the encoder accepts: 8-bit unsigned samples.
///
/// Already-u8 sources are borrowed rather than copied, as is the EXIF blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage<'a> {
    pub width: u32,
    pub height: u32,
    pub layout: BandLayout,
    pub pixels: Cow<'a, [u8]>,
    /// EXIF data to embed alongside the pixels
    pub exif: Option<&'a [u8]>,
}

/// Cast to u8 with clipping.
trait ToU8: Copy {
    fn to_u8(self) -> u8;
}

impl ToU8 for i8 {
    fn to_u8(self) -> u8 {
        self.max(0) as u8
    }
}

impl ToU8 for u16 {
    fn to_u8(self) -> u8 {
        self.min(255) as u8
    }
}

impl ToU8 for i16 {
    fn to_u8(self) -> u8 {
        self.clamp(0, 255) as u8
    }
}

impl ToU8 for u32 {
    fn to_u8(self) -> u8 {
        self.min(255) as u8
    }
}

impl ToU8 for i32 {
    fn to_u8(self) -> u8 {
        self.clamp(0, 255) as u8
    }
}

// Float to int `as` casts saturate and map NaN to 0.
impl ToU8 for f32 {
    fn to_u8(self) -> u8 {
        self.round() as u8
    }
}

impl ToU8 for f64 {
    fn to_u8(self) -> u8 {
        self.round() as u8
    }
}

fn cast<T: ToU8>(samples: &[T]) -> Vec<u8> {
    samples.iter().map(|&v| v.to_u8()).collect()
}

/// Convert `samples` to 8-bit unsigned samples.
pub fn cast_to_u8(samples: &Samples) -> Cow<'_, [u8]> {
    match samples {
        Samples::U8(v) => Cow::Borrowed(v.as_slice()),
        Samples::I8(v) => Cow::Owned(cast(v)),
        Samples::U16(v) => Cow::Owned(cast(v)),
        Samples::I16(v) => Cow::Owned(cast(v)),
        Samples::U32(v) => Cow::Owned(cast(v)),
        Samples::I32(v) => Cow::Owned(cast(v)),
        Samples::F32(v) => Cow::Owned(cast(v)),
        Samples::F64(v) => Cow::Owned(cast(v)),
    }
}

/// Check the band layout and cast the image to 8-bit samples, carrying the
/// image's EXIF data along if it can be saved.
///
/// # Errors
///
/// Returns `SaveError::UnsupportedBands` if the image isn't mono, RGB or CMYK.
pub fn normalize(image: &SourceImage) -> Result<NormalizedImage<'_>, SaveError> {
    let layout = BandLayout::from_bands(image.bands())?;
    debug!(
        format = ?image.format(),
        layout = ?layout,
        "Normalizing pixels to 8-bit"
    );

    Ok(NormalizedImage {
        width: image.width(),
        height: image.height(),
        layout,
        pixels: cast_to_u8(image.samples()),
        exif: resolve_exif(image),
    })
}


// ============================================================================
// Property-Based Tests
// ============================================================================
