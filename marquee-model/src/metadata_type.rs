use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::ModelError;

/// Classification tag for every entity the engine can return or decorate.
///
/// Variant order is the canonical fragment order used when composing unions:
/// movie, series, season, episode. `Person` and `BoxedSet` only ever own
/// artwork; they have no unified row fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum MetadataType {
    Movie,
    Series,
    Season,
    Episode,
    Person,
    #[cfg_attr(feature = "serde", serde(rename = "BOXSET"))]
    BoxedSet,
}

/// The four video types in canonical union order.
pub const VIDEO_TYPES: [MetadataType; 4] = [
    MetadataType::Movie,
    MetadataType::Series,
    MetadataType::Season,
    MetadataType::Episode,
];

impl MetadataType {
    /// Stored/wire form; also the literal discriminator emitted by fragments.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetadataType::Movie => "MOVIE",
            MetadataType::Series => "SERIES",
            MetadataType::Season => "SEASON",
            MetadataType::Episode => "EPISODE",
            MetadataType::Person => "PERSON",
            MetadataType::BoxedSet => "BOXSET",
        }
    }

    pub const fn is_video(&self) -> bool {
        matches!(
            self,
            MetadataType::Movie
                | MetadataType::Series
                | MetadataType::Season
                | MetadataType::Episode
        )
    }

    /// Parses the stored form, ignoring ASCII case.
    pub fn parse(value: &str) -> Result<Self, ModelError> {
        let value = value.trim();
        [
            MetadataType::Movie,
            MetadataType::Series,
            MetadataType::Season,
            MetadataType::Episode,
            MetadataType::Person,
            MetadataType::BoxedSet,
        ]
        .into_iter()
        .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
        .ok_or_else(|| ModelError::UnknownMetadataType(value.to_string()))
    }
}

impl FromStr for MetadataType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetadataType::parse(s)
    }
}

impl Display for MetadataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_follows_union_order() {
        let mut shuffled = vec![
            MetadataType::Episode,
            MetadataType::Movie,
            MetadataType::Season,
            MetadataType::Series,
        ];
        shuffled.sort();
        assert_eq!(shuffled, VIDEO_TYPES.to_vec());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(MetadataType::parse("season"), Ok(MetadataType::Season));
        assert_eq!(MetadataType::parse("BoxSet"), Ok(MetadataType::BoxedSet));
        assert!(MetadataType::parse("trailer").is_err());
    }

    #[test]
    fn only_four_types_are_video() {
        assert!(VIDEO_TYPES.iter().all(MetadataType::is_video));
        assert!(!MetadataType::Person.is_video());
        assert!(!MetadataType::BoxedSet.is_video());
    }
}
