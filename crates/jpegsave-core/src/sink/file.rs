//! File sink.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use super::EncodedPayload;
use crate::SaveError;

/// Filename suffixes conventionally used for JPEG files.
pub const JPEG_SUFFIXES: &[&str] = &[".jpg", ".jpeg", ".jpe"];

/// Returns true if `path` ends with one of [`JPEG_SUFFIXES`], ignoring case.
pub fn has_jpeg_suffix(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            JPEG_SUFFIXES
                .iter()
                .any(|suffix| suffix[1..].eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Write the whole payload to `path`, creating or truncating the file.
///
/// Returns the number of bytes written. A failed write may leave a partial
/// file behind; it is never reported as success.
pub fn write_file(path: &Path, payload: EncodedPayload) -> Result<usize, SaveError> {
    let to_error = |source| SaveError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    debug!(path = %path.display(), len = payload.len(), "Writing JPEG file");

    let mut file = File::create(path).map_err(to_error)?;
    file.write_all(payload.as_bytes()).map_err(to_error)?;
    file.flush().map_err(to_error)?;

    Ok(payload.len())
}
