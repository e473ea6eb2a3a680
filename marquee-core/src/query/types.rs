use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use marquee_model::{ArtworkType, SortOrder};
use serde::{Deserialize, Serialize};

/// Which way an active facet points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Include,
    Exclude,
}

/// One optional filter dimension.
///
/// Include and exclude live in a single field, so a facet can never be both
/// at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet<T> {
    Unset,
    Include(T),
    Exclude(T),
}

impl<T> Default for Facet<T> {
    fn default() -> Self {
        Facet::Unset
    }
}

impl<T> Facet<T> {
    pub fn is_set(&self) -> bool {
        !matches!(self, Facet::Unset)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Facet::Unset => None,
            Facet::Include(value) | Facet::Exclude(value) => Some(value),
        }
    }

    /// Polarity and value of an active facet.
    pub fn active(&self) -> Option<(Polarity, &T)> {
        match self {
            Facet::Unset => None,
            Facet::Include(value) => Some((Polarity::Include, value)),
            Facet::Exclude(value) => Some((Polarity::Exclude, value)),
        }
    }

    pub fn new(polarity: Polarity, value: T) -> Self {
        match polarity {
            Polarity::Include => Facet::Include(value),
            Polarity::Exclude => Facet::Exclude(value),
        }
    }
}

/// Inclusive publication year range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }
}

/// Identifier-or-name lookup used by studio, certification and award facets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKey {
    Id(i64),
    Name(String),
}

impl LookupKey {
    /// An all-digit value is an identifier; anything else is a name.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if !trimmed.is_empty()
            && trimmed.bytes().all(|b| b.is_ascii_digit())
            && let Ok(id) = trimmed.parse::<i64>()
        {
            return LookupKey::Id(id);
        }
        LookupKey::Name(trimmed.to_string())
    }
}

impl From<i64> for LookupKey {
    fn from(id: i64) -> Self {
        LookupKey::Id(id)
    }
}

impl From<&str> for LookupKey {
    fn from(raw: &str) -> Self {
        LookupKey::parse(raw)
    }
}

impl From<String> for LookupKey {
    fn from(raw: String) -> Self {
        LookupKey::parse(&raw)
    }
}

/// Where a rating value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingSource {
    /// Average over every source of the row.
    Combined,
    /// One named source database (`imdb`, `tmdb`, ...).
    Source(String),
}

impl RatingSource {
    /// `combined` (any case) selects averaging; anything else names a source.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("combined") {
            RatingSource::Combined
        } else {
            RatingSource::Source(trimmed.to_ascii_lowercase())
        }
    }
}

/// Rating bucket filter. Stored ratings are 0..=100 and compared as
/// `round(rating / 10)` against `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingFilter {
    pub source: Option<RatingSource>,
    pub value: i32,
}

/// The three mutually exclusive recency sources for the `newest` value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum NewestSource {
    Creation,
    LastScan,
    #[default]
    FileDate,
}

impl NewestSource {
    /// Selects a source by key. Unknown keys fall back to the file date.
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "creation" | "created" | "create" => NewestSource::Creation,
            "last-scan" | "lastscan" | "last_scan" | "scanned" => {
                NewestSource::LastScan
            }
            _ => NewestSource::FileDate,
        }
    }

    pub const fn key(&self) -> &'static str {
        match self {
            NewestSource::Creation => "creation",
            NewestSource::LastScan => "last-scan",
            NewestSource::FileDate => "file-date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewestFilter {
    pub source: NewestSource,
    pub threshold: DateTime<Utc>,
}

/// Named video resolution buckets, matched on media file width.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Sd,
    Hd720,
    Hd1080,
    Uhd4k,
    Uhd8k,
}

impl Resolution {
    /// Inclusive width range in pixels.
    pub const fn width_range(&self) -> (i64, i64) {
        match self {
            Resolution::Sd => (0, 1279),
            Resolution::Hd720 => (1280, 1919),
            Resolution::Hd1080 => (1920, 3839),
            Resolution::Uhd4k => (3840, 7679),
            Resolution::Uhd8k => (7680, i32::MAX as i64),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sd" => Some(Resolution::Sd),
            "720" | "720p" | "hd720" | "hd" => Some(Resolution::Hd720),
            "1080" | "1080p" | "hd1080" | "fhd" => Some(Resolution::Hd1080),
            "2160" | "2160p" | "4k" | "uhd" | "uhd4k" => {
                Some(Resolution::Uhd4k)
            }
            "4320" | "4320p" | "8k" | "uhd8k" => Some(Resolution::Uhd8k),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    #[default]
    Title,
    OriginalTitle,
    SortTitle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Begins,
    Ends,
    #[default]
    Contains,
    Exact,
}

/// Case-insensitive title search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub field: SearchField,
    pub mode: SearchMode,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            field: SearchField::default(),
            mode: SearchMode::default(),
        }
    }

    /// `LIKE` pattern with `\`, `%` and `_` escaped. Case is left alone;
    /// the store folds both sides.
    pub fn like_pattern(&self) -> String {
        let mut escaped = String::with_capacity(self.text.len() + 2);
        for ch in self.text.trim().chars() {
            if matches!(ch, '\\' | '%' | '_') {
                escaped.push('\\');
            }
            escaped.push(ch);
        }
        match self.mode {
            SearchMode::Begins => format!("{escaped}%"),
            SearchMode::Ends => format!("%{escaped}"),
            SearchMode::Contains => format!("%{escaped}%"),
            SearchMode::Exact => escaped,
        }
    }
}

/// Fields available for ordering unified rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Title,
    SortTitle,
    OriginalTitle,
    Year,
    ReleaseDate,
    Newest,
    Id,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: u32,
    /// `None` uses the configured default page size.
    pub limit: Option<u32>,
    /// Also run the count round-trip.
    pub with_total: bool,
}

/// Optional projection columns, in canonical projection order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ExtraColumn {
    Plot,
    Outline,
    Tagline,
    TopRank,
    CreationTimestamp,
    LastScanned,
}

impl ExtraColumn {
    pub const ALL: [ExtraColumn; 6] = [
        ExtraColumn::Plot,
        ExtraColumn::Outline,
        ExtraColumn::Tagline,
        ExtraColumn::TopRank,
        ExtraColumn::CreationTimestamp,
        ExtraColumn::LastScanned,
    ];

    pub const fn alias(&self) -> &'static str {
        match self {
            ExtraColumn::Plot => "plot",
            ExtraColumn::Outline => "outline",
            ExtraColumn::Tagline => "tagline",
            ExtraColumn::TopRank => "top_rank",
            ExtraColumn::CreationTimestamp => "create_timestamp",
            ExtraColumn::LastScanned => "last_scanned",
        }
    }
}

/// Artwork to attach to the resolved rows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArtworkRequest {
    pub types: BTreeSet<ArtworkType>,
    /// Order of located instances by creation time.
    pub order: SortOrder,
    /// Rendition profile; `None` uses the configured profile.
    pub profile: Option<String>,
}

impl ArtworkRequest {
    pub fn new(types: impl IntoIterator<Item = ArtworkType>) -> Self {
        Self {
            types: types.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn newest_first(mut self) -> Self {
        self.order = SortOrder::Descending;
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_key_detects_numeric_identifiers() {
        assert_eq!(LookupKey::parse(" 42 "), LookupKey::Id(42));
        assert_eq!(
            LookupKey::parse("Warner Bros."),
            LookupKey::Name("Warner Bros.".into())
        );
        assert_eq!(LookupKey::parse("-3"), LookupKey::Name("-3".into()));
    }

    #[test]
    fn unknown_newest_key_falls_back_to_file_date() {
        assert_eq!(NewestSource::from_key("creation"), NewestSource::Creation);
        assert_eq!(NewestSource::from_key("LAST-SCAN"), NewestSource::LastScan);
        assert_eq!(NewestSource::from_key("whatever"), NewestSource::FileDate);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        let mut search = SearchQuery::new("100%_Pure\\");
        search.mode = SearchMode::Begins;
        assert_eq!(search.like_pattern(), "100\\%\\_Pure\\\\%");

        search.mode = SearchMode::Exact;
        assert_eq!(search.like_pattern(), "100\\%\\_Pure\\\\");
    }

    #[test]
    fn resolution_buckets_do_not_overlap() {
        let buckets = [
            Resolution::Sd,
            Resolution::Hd720,
            Resolution::Hd1080,
            Resolution::Uhd4k,
            Resolution::Uhd8k,
        ];
        for pair in buckets.windows(2) {
            let (_, upper) = pair[0].width_range();
            let (lower, _) = pair[1].width_range();
            assert_eq!(upper + 1, lower);
        }
        assert_eq!(Resolution::parse("1080p"), Some(Resolution::Hd1080));
        assert_eq!(Resolution::parse("4K"), Some(Resolution::Uhd4k));
    }
}
