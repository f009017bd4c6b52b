//! Core types describing a ready-to-save image.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::SaveError;

/// Metadata field holding an embedded ICC profile.
pub const ICC_PROFILE_FIELD: &str = "icc-profile-data";

/// Metadata field holding raw EXIF data (TIFF structure, no `Exif\0\0` prefix).
pub const EXIF_FIELD: &str = "exif-data";

/// Per-sample numeric format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleFormat {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl SampleFormat {
    /// Every sample format, in widening order.
    pub const ALL: [SampleFormat; 8] = [
        SampleFormat::U8,
        SampleFormat::I8,
        SampleFormat::U16,
        SampleFormat::I16,
        SampleFormat::U32,
        SampleFormat::I32,
        SampleFormat::F32,
        SampleFormat::F64,
    ];
}

/// Band-interleaved, row-major sample storage.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    U8(Vec<u8>),
    I8(Vec<i8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl Samples {
    pub fn format(&self) -> SampleFormat {
        match self {
            Samples::U8(_) => SampleFormat::U8,
            Samples::I8(_) => SampleFormat::I8,
            Samples::U16(_) => SampleFormat::U16,
            Samples::I16(_) => SampleFormat::I16,
            Samples::U32(_) => SampleFormat::U32,
            Samples::I32(_) => SampleFormat::I32,
            Samples::F32(_) => SampleFormat::F32,
            Samples::F64(_) => SampleFormat::F64,
        }
    }

    /// Number of samples (not pixels).
    pub fn len(&self) -> usize {
        match self {
            Samples::U8(v) => v.len(),
            Samples::I8(v) => v.len(),
            Samples::U16(v) => v.len(),
            Samples::I16(v) => v.len(),
            Samples::U32(v) => v.len(),
            Samples::I32(v) => v.len(),
            Samples::F32(v) => v.len(),
            Samples::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Named binary metadata attached to an image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    blobs: BTreeMap<String, Vec<u8>>,
}

impl ImageMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a blob, replacing any previous value under the same name.
    pub fn set_blob(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.blobs.insert(name.into(), data);
    }

    pub fn get_blob(&self, name: &str) -> Option<&[u8]> {
        self.blobs.get(name).map(Vec::as_slice)
    }

    pub fn remove_blob(&mut self, name: &str) -> Option<Vec<u8>> {
        self.blobs.remove(name)
    }

    /// The embedded ICC profile, if any.
    pub fn icc_profile(&self) -> Option<&[u8]> {
        self.get_blob(ICC_PROFILE_FIELD)
    }

    /// Attached EXIF data, if any.
    pub fn exif(&self) -> Option<&[u8]> {
        self.get_blob(EXIF_FIELD)
    }
}

/// A fully computed image, ready to be saved.
///
/// The save pipeline only ever borrows a `SourceImage`, so one image can be
/// saved from several threads at once.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) bands: u32,
    pub(crate) samples: Samples,
    pub(crate) metadata: ImageMetadata,
}

impl SourceImage {
    /// Create an image from band-interleaved samples.
    ///
    /// # Errors
    ///
    /// Returns `SaveError::InvalidDimensions` if any of width, height or bands
    /// is zero or their product overflows `usize`, and
    /// `SaveError::InvalidPixelData` if the number of samples is not
    /// `width * height * bands`.
    pub fn new(width: u32, height: u32, bands: u32, samples: Samples) -> Result<Self, SaveError> {
        if width == 0 || height == 0 || bands == 0 {
            return Err(SaveError::InvalidDimensions {
                width,
                height,
                bands,
            });
        }

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(bands as usize))
            .ok_or(SaveError::InvalidDimensions {
                width,
                height,
                bands,
            })?;
        if samples.len() != expected {
            return Err(SaveError::InvalidPixelData {
                expected,
                actual: samples.len(),
            });
        }

        Ok(Self {
            width,
            height,
            bands,
            samples,
            metadata: ImageMetadata::default(),
        })
    }

    pub fn with_metadata(mut self, metadata: ImageMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach an embedded ICC profile.
    pub fn with_icc_profile(mut self, icc: Vec<u8>) -> Self {
        self.metadata.set_blob(ICC_PROFILE_FIELD, icc);
        self
    }

    /// Attach EXIF data, saved as an APP1 segment.
    pub fn with_exif(mut self, exif: Vec<u8>) -> Self {
        self.metadata.set_blob(EXIF_FIELD, exif);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bands(&self) -> u32 {
        self.bands
    }

    pub fn format(&self) -> SampleFormat {
        self.samples.format()
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    pub fn metadata(&self) -> &ImageMetadata {
        &self.metadata
    }
}
