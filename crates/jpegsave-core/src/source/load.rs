//! Building a [`SourceImage`] from files decoded with the `image` crate.

use std::path::Path;

use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use thiserror::Error;
use tracing::debug;

use super::{Samples, SourceImage};

/// Errors that can occur while loading an input image.
#[derive(Debug, Error)]
pub enum LoadError {
    /// I/O error during file reading.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The file could not be decoded.
    #[error("Corrupted or unsupported image file: {0}")]
    CorruptedFile(String),
}

/// Decode an image file, keeping its embedded ICC profile and EXIF data as
/// metadata.
///
/// EXIF orientation is applied so that the pixels are saved upright, and the
/// orientation tag in the kept EXIF data is reset to match.
///
/// # Errors
///
/// Returns `LoadError::IoError` if the file cannot be opened and
/// `LoadError::CorruptedFile` if it cannot be decoded.
pub fn load_image(path: impl AsRef<Path>) -> Result<SourceImage, LoadError> {
    let path = path.as_ref();
    let reader = ImageReader::open(path)?.with_guessed_format()?;

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| LoadError::CorruptedFile(e.to_string()))?;

    // A broken profile or EXIF chunk should not prevent loading the pixels
    let icc = decoder.icc_profile().unwrap_or(None);
    let mut exif = decoder.exif_metadata().unwrap_or(None);
    let orientation = decoder
        .orientation()
        .map_err(|e| LoadError::CorruptedFile(e.to_string()))?;

    let mut img =
        DynamicImage::from_decoder(decoder).map_err(|e| LoadError::CorruptedFile(e.to_string()))?;
    img.apply_orientation(orientation);
    if let Some(exif) = exif.as_mut() {
        let _ = Orientation::remove_from_exif_chunk(exif);
    }

    debug!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        color = ?img.color(),
        has_icc = icc.is_some(),
        has_exif = exif.is_some(),
        "Loaded input image"
    );

    let mut source = SourceImage::from(img);
    if let Some(icc) = icc.filter(|icc| !icc.is_empty()) {
        source = source.with_icc_profile(icc);
    }
    if let Some(exif) = exif.filter(|exif| !exif.is_empty()) {
        source = source.with_exif(exif);
    }
    Ok(source)
}

impl From<DynamicImage> for SourceImage {
    /// Alpha is dropped: four bands always mean CMYK to the save stage.
    fn from(img: DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        let (bands, samples) = match img {
            DynamicImage::ImageLuma8(buf) => (1, Samples::U8(buf.into_raw())),
            DynamicImage::ImageRgb8(buf) => (3, Samples::U8(buf.into_raw())),
            DynamicImage::ImageLuma16(buf) => (1, Samples::U16(buf.into_raw())),
            DynamicImage::ImageRgb16(buf) => (3, Samples::U16(buf.into_raw())),
            DynamicImage::ImageRgb32F(buf) => (3, Samples::F32(buf.into_raw())),
            img @ DynamicImage::ImageLumaA8(_) => (1, Samples::U8(img.into_luma8().into_raw())),
            img @ DynamicImage::ImageLumaA16(_) => {
                (1, Samples::U16(img.into_luma16().into_raw()))
            }
            img @ DynamicImage::ImageRgba16(_) => (3, Samples::U16(img.into_rgb16().into_raw())),
            img @ DynamicImage::ImageRgba32F(_) => {
                (3, Samples::F32(img.into_rgb32f().into_raw()))
            }
            other => (3, Samples::U8(other.into_rgb8().into_raw())),
        };

        SourceImage {
            width,
            height,
            bands,
            samples,
            metadata: Default::default(),
        }
    }
}
