//! MIME stream sink, for images served straight from a CGI-style program.
//!
//! The response is two header lines, a blank line and the JPEG body. Once the
//! headers are out there is no way to take them back: a failed body write
//! leaves the stream as it is and reports the error.

use std::io::{self, Write};

use tracing::{debug, warn};

use super::EncodedPayload;
use crate::SaveError;

/// MIME type of the response body.
pub const CONTENT_TYPE: &str = "image/jpeg";

/// Write headers and payload to `out`, then flush.
///
/// Returns the number of body bytes written.
pub fn write_mime<W: Write + ?Sized>(out: &mut W, payload: EncodedPayload) -> Result<usize, SaveError> {
    let expected = payload.len();
    debug!(len = expected, "Writing MIME response");

    write!(out, "Content-length: {expected}\r\n").map_err(SaveError::StreamHeader)?;
    write!(out, "Content-type: {CONTENT_TYPE}\r\n").map_err(SaveError::StreamHeader)?;
    out.write_all(b"\r\n").map_err(SaveError::StreamHeader)?;

    let written = write_counted(out, payload.as_bytes()).map_err(SaveError::StreamBody)?;
    if written != expected {
        warn!(expected, written, "MIME body truncated");
        return Err(SaveError::ShortWrite { expected, written });
    }

    out.flush().map_err(SaveError::StreamFlush)?;
    Ok(written)
}

/// Push `buf` into `out` until it stops accepting bytes, and report how many
/// it took. A return value below `buf.len()` means the writer gave up.
fn write_counted<W: Write + ?Sized>(out: &mut W, buf: &[u8]) -> io::Result<usize> {
    let mut written = 0;
    while written < buf.len() {
        match out.write(&buf[written..]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(written)
}
