//! Save options: quality factor and ICC profile directive.
//!
//! Options are plain values with validated defaults. Nothing is checked at
//! construction time; [`crate::SaveRequest::validate`] rejects bad values
//! before any encoding work starts.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::SaveError;

/// Profile string meaning "don't attach a profile".
pub const NO_PROFILE: &str = "none";

/// A JPEG quality factor, guaranteed to be in 1-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

impl Quality {
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 100;
    pub const DEFAULT: Quality = Quality(75);

    /// Validate a quality factor.
    ///
    /// # Errors
    ///
    /// Returns `SaveError::QualityOutOfRange` for values outside 1-100.
    pub fn new(value: i32) -> Result<Self, SaveError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Quality(value as u8))
        } else {
            Err(SaveError::QualityOutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which ICC profile, if any, to embed in the output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum ProfileDirective {
    /// Attach the image's own profile if it carries one.
    #[default]
    Embedded,
    /// Attach the profile loaded from this file.
    Path(PathBuf),
    /// Attach no profile, even if the image carries one.
    NoProfile,
}

impl ProfileDirective {
    /// Interpret an optional profile string: `None` uses the embedded
    /// profile, `"none"` suppresses profiles, anything else is a file path.
    pub fn from_option(value: Option<&str>) -> Self {
        match value {
            None => ProfileDirective::Embedded,
            Some(NO_PROFILE) => ProfileDirective::NoProfile,
            Some(path) => ProfileDirective::Path(PathBuf::from(path)),
        }
    }
}

impl FromStr for ProfileDirective {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_option(Some(s)))
    }
}

impl From<Option<String>> for ProfileDirective {
    fn from(value: Option<String>) -> Self {
        Self::from_option(value.as_deref())
    }
}

impl From<ProfileDirective> for Option<String> {
    fn from(value: ProfileDirective) -> Self {
        match value {
            ProfileDirective::Embedded => None,
            ProfileDirective::Path(path) => Some(path.to_string_lossy().into_owned()),
            ProfileDirective::NoProfile => Some(NO_PROFILE.to_string()),
        }
    }
}

impl fmt::Display for ProfileDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileDirective::Embedded => f.write_str("embedded"),
            ProfileDirective::Path(path) => write!(f, "{}", path.display()),
            ProfileDirective::NoProfile => f.write_str(NO_PROFILE),
        }
    }
}

/// Options shared by every JPEG save operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveOptions {
    /// Quality factor (1 to 100, default 75)
    pub quality: i32,
    /// ICC profile to embed
    pub profile: ProfileDirective,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            quality: i32::from(Quality::DEFAULT.get()),
            profile: ProfileDirective::Embedded,
        }
    }
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> SaveOptionsBuilder {
        SaveOptionsBuilder::default()
    }

    /// Check the quality factor.
    pub fn validated_quality(&self) -> Result<Quality, SaveError> {
        Quality::new(self.quality)
    }
}

/// Builder for SaveOptions
#[derive(Debug, Default)]
pub struct SaveOptionsBuilder {
    quality: Option<i32>,
    profile: Option<ProfileDirective>,
}

impl SaveOptionsBuilder {
    pub fn quality(mut self, quality: i32) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Set the profile from a string, with `"none"` meaning no profile.
    pub fn profile(mut self, profile: &str) -> Self {
        self.profile = Some(ProfileDirective::from_option(Some(profile)));
        self
    }

    pub fn profile_directive(mut self, directive: ProfileDirective) -> Self {
        self.profile = Some(directive);
        self
    }

    pub fn no_profile(self) -> Self {
        self.profile_directive(ProfileDirective::NoProfile)
    }

    pub fn build(self) -> SaveOptions {
        let default = SaveOptions::default();
        SaveOptions {
            quality: self.quality.unwrap_or(default.quality),
            profile: self.profile.unwrap_or(default.profile),
        }
    }
}
