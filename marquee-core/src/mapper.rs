//! Explicit column-to-field mapping for the unified row shape.
//!
//! Stores decode every result column according to its [`ColumnKind`] into a
//! [`FlatRow`]; [`VideoRowMapper`] then turns flat rows into
//! [`UnifiedVideoRow`]s. The episode-number sign is inspected here and
//! nowhere else.

use chrono::{DateTime, NaiveDate, Utc};
use marquee_model::{
    ExtraValues, Hierarchy, MetadataType, NON_EPISODIC, UnifiedVideoRow,
};

use crate::error::{QueryError, Result};
use crate::query::ExtraColumn;
use crate::sql::SqlType;

/// Semantic type of one result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Id,
    OptionalId,
    /// Stored tag parsed into a Rust enum (`MOVIE`, `POSTER`, ...).
    Enum,
    Text,
    Integer,
    Date,
    Boolean,
    Timestamp,
}

impl ColumnKind {
    /// Type used when a fragment has to project NULL for this column.
    pub const fn null_type(&self) -> SqlType {
        match self {
            ColumnKind::Id | ColumnKind::OptionalId => SqlType::BigInt,
            ColumnKind::Integer => SqlType::Integer,
            ColumnKind::Enum | ColumnKind::Text => SqlType::Text,
            ColumnKind::Date => SqlType::Date,
            ColumnKind::Boolean => SqlType::Boolean,
            ColumnKind::Timestamp => SqlType::Timestamp,
        }
    }
}

/// One decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    Int(i64),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

/// A decoded result row, one value per requested column kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRow(pub Vec<ColumnValue>);

impl FlatRow {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn value(&self, index: usize, column: &str) -> Result<&ColumnValue> {
        self.0.get(index).ok_or_else(|| {
            QueryError::RowMapping(format!(
                "missing column {column} at {index}"
            ))
        })
    }

    pub fn opt_i64(&self, index: usize, column: &str) -> Result<Option<i64>> {
        match self.value(index, column)? {
            ColumnValue::Null => Ok(None),
            ColumnValue::Int(value) => Ok(Some(*value)),
            other => Err(mismatch(column, "integer", other)),
        }
    }

    pub fn i64(&self, index: usize, column: &str) -> Result<i64> {
        self.opt_i64(index, column)?.ok_or_else(|| null_in(column))
    }

    pub fn opt_i32(&self, index: usize, column: &str) -> Result<Option<i32>> {
        self.opt_i64(index, column)?
            .map(|value| {
                i32::try_from(value).map_err(|_| {
                    QueryError::RowMapping(format!(
                        "{column} value {value} does not fit in i32"
                    ))
                })
            })
            .transpose()
    }

    pub fn opt_text(
        &self,
        index: usize,
        column: &str,
    ) -> Result<Option<String>> {
        match self.value(index, column)? {
            ColumnValue::Null => Ok(None),
            ColumnValue::Text(value) => Ok(Some(value.clone())),
            other => Err(mismatch(column, "text", other)),
        }
    }

    pub fn text(&self, index: usize, column: &str) -> Result<String> {
        self.opt_text(index, column)?.ok_or_else(|| null_in(column))
    }

    pub fn opt_bool(&self, index: usize, column: &str) -> Result<Option<bool>> {
        match self.value(index, column)? {
            ColumnValue::Null => Ok(None),
            ColumnValue::Bool(value) => Ok(Some(*value)),
            ColumnValue::Int(value) => Ok(Some(*value != 0)),
            other => Err(mismatch(column, "boolean", other)),
        }
    }

    pub fn opt_date(
        &self,
        index: usize,
        column: &str,
    ) -> Result<Option<NaiveDate>> {
        match self.value(index, column)? {
            ColumnValue::Null => Ok(None),
            ColumnValue::Date(value) => Ok(Some(*value)),
            other => Err(mismatch(column, "date", other)),
        }
    }

    pub fn opt_timestamp(
        &self,
        index: usize,
        column: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        match self.value(index, column)? {
            ColumnValue::Null => Ok(None),
            ColumnValue::Timestamp(value) => Ok(Some(*value)),
            other => Err(mismatch(column, "timestamp", other)),
        }
    }
}

fn mismatch(column: &str, expected: &str, found: &ColumnValue) -> QueryError {
    QueryError::RowMapping(format!(
        "column {column} expected {expected}, found {found:?}"
    ))
}

fn null_in(column: &str) -> QueryError {
    QueryError::RowMapping(format!("column {column} is unexpectedly NULL"))
}

/// Fixed leading columns of every unified row, in projection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnifiedColumn {
    Id,
    MetadataType,
    Title,
    OriginalTitle,
    SortTitle,
    PublicationYear,
    ReleaseDate,
    SeriesId,
    SeasonId,
    SeasonNumber,
    EpisodeNumber,
    Watched,
    Newest,
}

impl UnifiedColumn {
    pub const ALL: [UnifiedColumn; 13] = [
        UnifiedColumn::Id,
        UnifiedColumn::MetadataType,
        UnifiedColumn::Title,
        UnifiedColumn::OriginalTitle,
        UnifiedColumn::SortTitle,
        UnifiedColumn::PublicationYear,
        UnifiedColumn::ReleaseDate,
        UnifiedColumn::SeriesId,
        UnifiedColumn::SeasonId,
        UnifiedColumn::SeasonNumber,
        UnifiedColumn::EpisodeNumber,
        UnifiedColumn::Watched,
        UnifiedColumn::Newest,
    ];

    pub const fn alias(&self) -> &'static str {
        match self {
            UnifiedColumn::Id => "id",
            UnifiedColumn::MetadataType => "metadata_type",
            UnifiedColumn::Title => "title",
            UnifiedColumn::OriginalTitle => "original_title",
            UnifiedColumn::SortTitle => "sort_title",
            UnifiedColumn::PublicationYear => "publication_year",
            UnifiedColumn::ReleaseDate => "release_date",
            UnifiedColumn::SeriesId => "series_id",
            UnifiedColumn::SeasonId => "season_id",
            UnifiedColumn::SeasonNumber => "season_number",
            UnifiedColumn::EpisodeNumber => "episode_number",
            UnifiedColumn::Watched => "watched",
            UnifiedColumn::Newest => "newest",
        }
    }

    pub const fn kind(&self) -> ColumnKind {
        match self {
            UnifiedColumn::Id => ColumnKind::Id,
            UnifiedColumn::MetadataType => ColumnKind::Enum,
            UnifiedColumn::Title
            | UnifiedColumn::OriginalTitle
            | UnifiedColumn::SortTitle => ColumnKind::Text,
            UnifiedColumn::PublicationYear
            | UnifiedColumn::SeasonNumber
            | UnifiedColumn::EpisodeNumber => ColumnKind::Integer,
            UnifiedColumn::ReleaseDate => ColumnKind::Date,
            UnifiedColumn::SeriesId | UnifiedColumn::SeasonId => {
                ColumnKind::OptionalId
            }
            UnifiedColumn::Watched => ColumnKind::Boolean,
            UnifiedColumn::Newest => ColumnKind::Timestamp,
        }
    }

    const fn index(&self) -> usize {
        *self as usize
    }
}

impl ExtraColumn {
    pub const fn kind(&self) -> ColumnKind {
        match self {
            ExtraColumn::Plot | ExtraColumn::Outline | ExtraColumn::Tagline => {
                ColumnKind::Text
            }
            ExtraColumn::TopRank => ColumnKind::Integer,
            ExtraColumn::CreationTimestamp | ExtraColumn::LastScanned => {
                ColumnKind::Timestamp
            }
        }
    }
}

/// Maps flat rows of the unified projection into [`UnifiedVideoRow`]s.
#[derive(Debug, Clone, Default)]
pub struct VideoRowMapper {
    extras: Vec<ExtraColumn>,
}

impl VideoRowMapper {
    /// `extras` must be in projection (canonical) order.
    pub fn new(extras: impl IntoIterator<Item = ExtraColumn>) -> Self {
        let mut extras: Vec<ExtraColumn> = extras.into_iter().collect();
        extras.sort();
        extras.dedup();
        Self { extras }
    }

    /// Column kinds the store must decode, in projection order.
    pub fn column_kinds(&self) -> Vec<ColumnKind> {
        UnifiedColumn::ALL
            .iter()
            .map(UnifiedColumn::kind)
            .chain(self.extras.iter().map(ExtraColumn::kind))
            .collect()
    }

    pub fn map_all(&self, rows: &[FlatRow]) -> Result<Vec<UnifiedVideoRow>> {
        rows.iter().map(|row| self.map(row)).collect()
    }

    pub fn map(&self, row: &FlatRow) -> Result<UnifiedVideoRow> {
        use UnifiedColumn as C;

        let expected = UnifiedColumn::ALL.len() + self.extras.len();
        if row.len() != expected {
            return Err(QueryError::RowMapping(format!(
                "expected {expected} columns, found {}",
                row.len()
            )));
        }

        let at = |column: UnifiedColumn| (column.index(), column.alias());

        let (i, name) = at(C::Id);
        let id = row.i64(i, name)?;

        let (i, name) = at(C::MetadataType);
        let tag = row.text(i, name)?;
        let metadata_type = MetadataType::parse(&tag)
            .map_err(|err| QueryError::RowMapping(err.to_string()))?;

        let hierarchy = self.hierarchy(row, id, metadata_type)?;

        let (i, name) = at(C::Title);
        let title = row.opt_text(i, name)?;
        let (i, name) = at(C::OriginalTitle);
        let original_title = row.opt_text(i, name)?;
        let (i, name) = at(C::SortTitle);
        let sort_title = row.opt_text(i, name)?;
        let (i, name) = at(C::PublicationYear);
        let year = row.opt_i32(i, name)?;
        let (i, name) = at(C::ReleaseDate);
        let release_date = row.opt_date(i, name)?;
        let (i, name) = at(C::Watched);
        let watched = row.opt_bool(i, name)?;
        let (i, name) = at(C::Newest);
        let newest = row.opt_timestamp(i, name)?;

        let mut extras = ExtraValues::default();
        for (offset, column) in self.extras.iter().enumerate() {
            let index = UnifiedColumn::ALL.len() + offset;
            let name = column.alias();
            match column {
                ExtraColumn::Plot => extras.plot = row.opt_text(index, name)?,
                ExtraColumn::Outline => {
                    extras.outline = row.opt_text(index, name)?
                }
                ExtraColumn::Tagline => {
                    extras.tagline = row.opt_text(index, name)?
                }
                ExtraColumn::TopRank => {
                    extras.top_rank = row.opt_i32(index, name)?
                }
                ExtraColumn::CreationTimestamp => {
                    extras.created_at = row.opt_timestamp(index, name)?
                }
                ExtraColumn::LastScanned => {
                    extras.last_scanned = row.opt_timestamp(index, name)?
                }
            }
        }

        Ok(UnifiedVideoRow {
            id,
            metadata_type,
            title,
            original_title,
            sort_title,
            year,
            release_date,
            hierarchy,
            watched,
            newest,
            extras,
        })
    }

    fn hierarchy(
        &self,
        row: &FlatRow,
        id: i64,
        metadata_type: MetadataType,
    ) -> Result<Hierarchy> {
        use UnifiedColumn as C;

        let read = |column: UnifiedColumn| {
            row.opt_i64(column.index(), column.alias())
        };
        let episode_number = read(C::EpisodeNumber)?
            .unwrap_or(i64::from(NON_EPISODIC));
        let episodic = episode_number >= 0;

        let required = |column: UnifiedColumn| -> Result<i64> {
            read(column)?.ok_or_else(|| {
                QueryError::RowMapping(format!(
                    "{metadata_type} {id} has no {}",
                    column.alias()
                ))
            })
        };
        let narrow = |column: UnifiedColumn, value: i64| -> Result<i32> {
            i32::try_from(value).map_err(|_| {
                QueryError::RowMapping(format!(
                    "{} value {value} does not fit in i32",
                    column.alias()
                ))
            })
        };

        match (metadata_type, episodic) {
            (MetadataType::Movie, false) => Ok(Hierarchy::Standalone),
            (MetadataType::Series, false) => Ok(Hierarchy::Series),
            (MetadataType::Season, false) => Ok(Hierarchy::Season {
                series_id: required(C::SeriesId)?,
                season_number: narrow(
                    C::SeasonNumber,
                    required(C::SeasonNumber)?,
                )?,
            }),
            (MetadataType::Episode, true) => Ok(Hierarchy::Episode {
                series_id: required(C::SeriesId)?,
                season_id: required(C::SeasonId)?,
                season_number: narrow(
                    C::SeasonNumber,
                    required(C::SeasonNumber)?,
                )?,
                episode_number: narrow(C::EpisodeNumber, episode_number)?,
            }),
            (MetadataType::Person | MetadataType::BoxedSet, _) => {
                Err(QueryError::RowMapping(format!(
                    "{metadata_type} {id} cannot appear in a video listing"
                )))
            }
            (_, episodic) => Err(QueryError::RowMapping(format!(
                "{metadata_type} {id} has episode number {episode_number} \
                 (episodic: {episodic})"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(values: Vec<ColumnValue>) -> FlatRow {
        FlatRow(values)
    }

    fn base(metadata_type: &str) -> Vec<ColumnValue> {
        vec![
            ColumnValue::Int(7),
            ColumnValue::Text(metadata_type.into()),
            ColumnValue::Text("Title".into()),
            ColumnValue::Null,
            ColumnValue::Null,
            ColumnValue::Int(2004),
            ColumnValue::Date(NaiveDate::from_ymd_opt(2004, 5, 1).unwrap()),
            ColumnValue::Null,
            ColumnValue::Null,
            ColumnValue::Null,
            ColumnValue::Int(-1),
            ColumnValue::Int(1),
            ColumnValue::Null,
        ]
    }

    #[test]
    fn movie_row_maps_to_standalone() {
        let mapper = VideoRowMapper::default();
        let row = mapper.map(&flat(base("MOVIE"))).unwrap();
        assert_eq!(row.metadata_type, MetadataType::Movie);
        assert_eq!(row.hierarchy, Hierarchy::Standalone);
        assert_eq!(row.watched, Some(true));
        assert_eq!(row.year, Some(2004));
    }

    #[test]
    fn episode_row_requires_its_hierarchy() {
        let mapper = VideoRowMapper::default();
        let mut values = base("EPISODE");
        values[7] = ColumnValue::Int(1);
        values[8] = ColumnValue::Int(2);
        values[9] = ColumnValue::Int(3);
        values[10] = ColumnValue::Int(4);
        let row = mapper.map(&flat(values.clone())).unwrap();
        assert_eq!(
            row.hierarchy,
            Hierarchy::Episode {
                series_id: 1,
                season_id: 2,
                season_number: 3,
                episode_number: 4,
            }
        );

        values[8] = ColumnValue::Null;
        assert!(matches!(
            mapper.map(&flat(values)),
            Err(QueryError::RowMapping(_))
        ));
    }

    #[test]
    fn sign_and_type_must_agree() {
        let mapper = VideoRowMapper::default();
        let mut values = base("MOVIE");
        values[10] = ColumnValue::Int(3);
        assert!(matches!(
            mapper.map(&flat(values)),
            Err(QueryError::RowMapping(_))
        ));
    }

    #[test]
    fn extras_follow_canonical_order() {
        let mapper = VideoRowMapper::new([
            ExtraColumn::TopRank,
            ExtraColumn::Plot,
        ]);
        let kinds = mapper.column_kinds();
        assert_eq!(kinds.len(), 15);
        assert_eq!(kinds[13], ColumnKind::Text);
        assert_eq!(kinds[14], ColumnKind::Integer);

        let mut values = base("MOVIE");
        values.push(ColumnValue::Text("A plot".into()));
        values.push(ColumnValue::Int(12));
        let row = mapper.map(&flat(values)).unwrap();
        assert_eq!(row.extras.plot.as_deref(), Some("A plot"));
        assert_eq!(row.extras.top_rank, Some(12));
    }

    #[test]
    fn column_count_is_checked() {
        let mapper = VideoRowMapper::new([ExtraColumn::Plot]);
        assert!(matches!(
            mapper.map(&flat(base("SERIES"))),
            Err(QueryError::RowMapping(_))
        ));
    }
}
