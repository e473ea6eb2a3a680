use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};

use crate::{error::ModelError, metadata_type::MetadataType};

/// Artwork slot categories an owner can carry.
///
/// Stored as uppercase tags (`POSTER`, `FANART`, ...). Parsing is
/// ASCII-case-insensitive; unknown tags are rejected rather than preserved
/// because they cannot be requested through a typed filter anyway.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub enum ArtworkType {
    Poster,
    Fanart,
    Banner,
    Photo,
    VideoImage,
}

impl ArtworkType {
    /// Canonical representation used by the database schema.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ArtworkType::Poster => "POSTER",
            ArtworkType::Fanart => "FANART",
            ArtworkType::Banner => "BANNER",
            ArtworkType::Photo => "PHOTO",
            ArtworkType::VideoImage => "VIDEOIMAGE",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ModelError> {
        if value.eq_ignore_ascii_case("poster") {
            Ok(ArtworkType::Poster)
        } else if value.eq_ignore_ascii_case("fanart") {
            Ok(ArtworkType::Fanart)
        } else if value.eq_ignore_ascii_case("banner") {
            Ok(ArtworkType::Banner)
        } else if value.eq_ignore_ascii_case("photo") {
            Ok(ArtworkType::Photo)
        } else if value.eq_ignore_ascii_case("videoimage") {
            Ok(ArtworkType::VideoImage)
        } else {
            Err(ModelError::UnknownArtworkType(value.to_string()))
        }
    }
}

impl FromStr for ArtworkType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArtworkType::parse(s)
    }
}

impl fmt::Display for ArtworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ArtworkType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ArtworkType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        ArtworkType::parse(&value).map_err(serde::de::Error::custom)
    }
}

/// One located artwork candidate attached to an owner, optionally with the
/// rendition generated for the requested presentation profile.
///
/// A `None` rendition is a valid reference that has not been cached yet.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArtworkRef {
    pub owner_id: i64,
    pub owner_type: MetadataType,
    pub artwork_id: i64,
    pub artwork_type: ArtworkType,
    pub located_id: i64,
    pub language_code: Option<String>,
    pub located_at: Option<DateTime<Utc>>,
    pub generated_id: Option<i64>,
    pub cache_dir: Option<String>,
    pub cache_filename: Option<String>,
}

impl ArtworkRef {
    /// Whether a generated rendition exists and can be served from cache.
    pub fn is_cached(&self) -> bool {
        self.generated_id.is_some()
            && self.cache_dir.is_some()
            && self.cache_filename.is_some()
    }

    /// Relative cache path (`dir/filename`) when the rendition is cached.
    pub fn cache_path(&self) -> Option<String> {
        if !self.is_cached() {
            return None;
        }
        let dir = self.cache_dir.as_deref()?.trim_end_matches('/');
        let file = self.cache_filename.as_deref()?;
        Some(format!("{dir}/{file}"))
    }
}
