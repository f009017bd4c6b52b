//! ICC profile and EXIF resolution.
//!
//! The profile to embed is decided once per save, in a fixed order:
//!
//! 1. `"none"` attaches nothing, whatever the image carries.
//! 2. An explicit path attaches that file's bytes, overriding the image.
//! 3. Otherwise the image's `icc-profile-data` blob is attached if present.
//!
//! EXIF is independent of the profile directive: the image's `exif-data`
//! blob is saved if it fits in a JPEG, and dropped with a warning otherwise.

use std::fs;
use std::io;

use tracing::{debug, warn};

use crate::encode::MAX_EXIF_LEN;
use crate::options::ProfileDirective;
use crate::source::SourceImage;
use crate::SaveError;

/// The ICC profile chosen for a save, or its absence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResolvedProfile {
    #[default]
    None,
    Icc(Vec<u8>),
}

impl ResolvedProfile {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ResolvedProfile::None => None,
            ResolvedProfile::Icc(bytes) => Some(bytes),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ResolvedProfile::None)
    }
}

/// Decide which profile to embed for `image`.
///
/// # Errors
///
/// Returns `SaveError::ProfileUnreadable` if an explicit profile file can't be
/// read or is empty.
pub fn resolve_profile(
    directive: &ProfileDirective,
    image: &SourceImage,
) -> Result<ResolvedProfile, SaveError> {
    match directive {
        ProfileDirective::NoProfile => {
            debug!("Profile suppressed");
            Ok(ResolvedProfile::None)
        }
        ProfileDirective::Path(path) => {
            let bytes = fs::read(path).map_err(|source| SaveError::ProfileUnreadable {
                path: path.clone(),
                source,
            })?;
            if bytes.is_empty() {
                return Err(SaveError::ProfileUnreadable {
                    path: path.clone(),
                    source: io::Error::new(io::ErrorKind::InvalidData, "profile file is empty"),
                });
            }
            debug!(path = %path.display(), len = bytes.len(), "Loaded ICC profile");
            Ok(ResolvedProfile::Icc(bytes))
        }
        ProfileDirective::Embedded => match image.metadata().icc_profile() {
            Some(icc) if !icc.is_empty() => {
                debug!(len = icc.len(), "Using embedded ICC profile");
                Ok(ResolvedProfile::Icc(icc.to_vec()))
            }
            _ => Ok(ResolvedProfile::None),
        },
    }
}

/// The EXIF data to embed for `image`, if any.
///
/// Empty blobs count as absent. Blobs larger than one APP1 segment can hold
/// are skipped rather than failing the save.
pub fn resolve_exif(image: &SourceImage) -> Option<&[u8]> {
    match image.metadata().exif() {
        Some(exif) if exif.len() > MAX_EXIF_LEN => {
            warn!(len = exif.len(), max = MAX_EXIF_LEN, "EXIF data too large, not saved");
            None
        }
        Some(exif) if !exif.is_empty() => {
            debug!(len = exif.len(), "Using attached EXIF data");
            Some(exif)
        }
        _ => None,
    }
}
