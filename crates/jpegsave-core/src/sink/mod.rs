//! Destinations for encoded JPEG bytes.
//!
//! A save request has exactly one [`Sink`]. The set of sinks is closed, so
//! delivery is a plain `match` over the variant.

mod buffer;
mod file;
mod stream;

use std::io;
use std::path::PathBuf;

use tracing::info;

use crate::SaveError;

pub use buffer::{into_buffer, JpegBuffer};
pub use file::{has_jpeg_suffix, write_file, JPEG_SUFFIXES};
pub use stream::{write_mime, CONTENT_TYPE};

/// Where the encoded bytes go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    /// Write to this file, creating or truncating it.
    File(PathBuf),
    /// Hand the bytes to the caller.
    Buffer,
    /// Write a MIME response to standard output.
    Stream,
}

impl Sink {
    /// Operation name for this sink.
    pub fn nickname(&self) -> &'static str {
        match self {
            Sink::File(_) => "jpegsave",
            Sink::Buffer => "jpegsave_buffer",
            Sink::Stream => "jpegsave_mime",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Sink::File(_) => "save image to jpeg file",
            Sink::Buffer => "save image to jpeg buffer",
            Sink::Stream => "save image to jpeg mime",
        }
    }
}

/// The bytes produced by one encoder call.
///
/// Not `Clone`: a payload is handed to exactly one sink.
#[derive(Debug, PartialEq, Eq)]
pub struct EncodedPayload {
    bytes: Vec<u8>,
}

impl EncodedPayload {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

/// Outcome of a delivered save.
#[derive(Debug, PartialEq, Eq)]
pub enum Delivered {
    File { path: PathBuf, bytes_written: usize },
    Buffer(JpegBuffer),
    Stream { bytes_written: usize },
}

impl Delivered {
    /// Number of JPEG bytes delivered, headers excluded.
    pub fn len(&self) -> usize {
        match self {
            Delivered::File { bytes_written, .. } | Delivered::Stream { bytes_written } => {
                *bytes_written
            }
            Delivered::Buffer(buffer) => buffer.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_buffer(self) -> Option<JpegBuffer> {
        match self {
            Delivered::Buffer(buffer) => Some(buffer),
            _ => None,
        }
    }
}

/// Hand `payload` to `sink`.
pub fn deliver(payload: EncodedPayload, sink: Sink) -> Result<Delivered, SaveError> {
    let nickname = sink.nickname();
    let delivered = match sink {
        Sink::File(path) => {
            let bytes_written = write_file(&path, payload)?;
            Delivered::File {
                path,
                bytes_written,
            }
        }
        Sink::Buffer => Delivered::Buffer(into_buffer(payload)),
        Sink::Stream => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            let bytes_written = write_mime(&mut out, payload)?;
            Delivered::Stream { bytes_written }
        }
    };

    info!(operation = nickname, bytes = delivered.len(), "JPEG delivered");
    Ok(delivered)
}
