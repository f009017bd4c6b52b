//! Error types for the save pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::encode::EncodeError;

/// Broad classification of a [`SaveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid options or an image that cannot be saved as JPEG.
    Configuration,
    /// The JPEG encoder failed.
    Encode,
    /// Writing the encoded bytes to their destination failed.
    Io,
}

/// Errors that can occur while saving an image as JPEG.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Quality factor outside 1-100
    #[error("Invalid quality: {0} is outside the range 1 to 100")]
    QualityOutOfRange(i32),

    /// ICC profile file could not be read
    #[error("Unable to read ICC profile {}: {source}", path.display())]
    ProfileUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Band count is not one of the JPEG saveable layouts
    #[error("Unsupported band count {0}: JPEG saves 1 (mono), 3 (RGB) or 4 (CMYK) bands")]
    UnsupportedBands(u32),

    /// Width, height or band count is zero
    #[error("Invalid dimensions: {width}x{height} with {bands} bands")]
    InvalidDimensions { width: u32, height: u32, bands: u32 },

    /// Sample buffer length doesn't match the image geometry
    #[error("Invalid pixel data: expected {expected} samples (width * height * bands), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// The JPEG encoder failed
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Output file could not be created or written
    #[error("Unable to write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing the MIME headers failed
    #[error("Error writing output headers: {0}")]
    StreamHeader(#[source] io::Error),

    /// Writing the MIME body failed
    #[error("Error writing output: {0}")]
    StreamBody(#[source] io::Error),

    /// The MIME body was only partially written
    #[error("Error writing output: wrote {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },

    /// Flushing the output stream failed
    #[error("Error flushing output: {0}")]
    StreamFlush(#[source] io::Error),
}

impl SaveError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SaveError::QualityOutOfRange(_)
            | SaveError::ProfileUnreadable { .. }
            | SaveError::UnsupportedBands(_)
            | SaveError::InvalidDimensions { .. }
            | SaveError::InvalidPixelData { .. } => ErrorKind::Configuration,
            SaveError::Encode(_) => ErrorKind::Encode,
            SaveError::FileWrite { .. }
            | SaveError::StreamHeader(_)
            | SaveError::StreamBody(_)
            | SaveError::ShortWrite { .. }
            | SaveError::StreamFlush(_) => ErrorKind::Io,
        }
    }

    /// Returns true for option and image validation failures.
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}
