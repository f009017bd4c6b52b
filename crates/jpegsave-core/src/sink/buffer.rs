//! Memory buffer sink.

use std::ops::Deref;

use super::EncodedPayload;

/// An encoded JPEG owned by the caller.
///
/// The bytes are the encoder's own allocation, moved rather than copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegBuffer {
    bytes: Vec<u8>,
}

impl JpegBuffer {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for JpegBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl Deref for JpegBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<JpegBuffer> for Vec<u8> {
    fn from(buffer: JpegBuffer) -> Self {
        buffer.bytes
    }
}

/// Transfer ownership of the payload to the caller.
pub fn into_buffer(payload: EncodedPayload) -> JpegBuffer {
    JpegBuffer {
        bytes: payload.into_vec(),
    }
}
