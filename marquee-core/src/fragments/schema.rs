//! Column mapping and join paths for each video entity type.

use std::fmt;

use marquee_model::{MetadataType, NON_EPISODIC};

use crate::error::{QueryError, Result};
use crate::mapper::UnifiedColumn;
use crate::query::{ExtraColumn, SearchField};
use crate::sql::{CmpOp, Expr, Predicate, Select, col};

/// Lifecycle status that hides a row from every listing.
pub(crate) const DELETED: &str = "DELETED";

/// Which link-table family a relation lookup goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkOwner {
    /// `videodata_*` tables keyed by `videodata_id`.
    Videodata,
    /// `series_*` tables keyed by `series_id`.
    Series,
}

impl LinkOwner {
    pub(crate) const fn key_column(&self) -> &'static str {
        match self {
            LinkOwner::Videodata => "videodata_id",
            LinkOwner::Series => "series_id",
        }
    }

    /// Picks the link table for this owner family.
    pub(crate) const fn table(
        &self,
        videodata: &'static str,
        series: &'static str,
    ) -> &'static str {
        match self {
            LinkOwner::Videodata => videodata,
            LinkOwner::Series => series,
        }
    }
}

/// Link-table family plus the outer expression a correlated lookup binds to.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OwnerKey {
    pub owner: LinkOwner,
    pub id: Expr,
}

impl OwnerKey {
    fn videodata(id: Expr) -> Self {
        Self {
            owner: LinkOwner::Videodata,
            id,
        }
    }

    fn series(id: Expr) -> Self {
        Self {
            owner: LinkOwner::Series,
            id,
        }
    }
}

/// Where the media files of a row live.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FileScope {
    /// Files attached directly to a videodata row.
    Own(Expr),
    /// Files of the episodes of one season.
    SeasonEpisodes(Expr),
    /// Files of the episodes of one series.
    SeriesEpisodes(Expr),
}

impl FileScope {
    /// `FROM mediafile mf` joined to the owning row(s); no file filters yet.
    pub(crate) fn mediafiles(&self) -> Select {
        let files = Select::from("mediafile", "mf").join(
            "mediafile_videodata",
            "mv",
            col("mv", "mediafile_id").eq(col("mf", "id")),
        );
        match self {
            FileScope::Own(videodata_id) => {
                files.filter(col("mv", "videodata_id").eq(videodata_id.clone()))
            }
            FileScope::SeasonEpisodes(season_id) => files
                .join(
                    "videodata",
                    "ev",
                    col("ev", "id").eq(col("mv", "videodata_id")),
                )
                .filter(live_episode("ev"))
                .filter(col("ev", "season_id").eq(season_id.clone())),
            FileScope::SeriesEpisodes(series_id) => files
                .join(
                    "videodata",
                    "ev",
                    col("ev", "id").eq(col("mv", "videodata_id")),
                )
                .join(
                    "season",
                    "es",
                    col("es", "id").eq(col("ev", "season_id")),
                )
                .filter(live_episode("ev"))
                .filter(col("es", "series_id").eq(series_id.clone())),
        }
    }

    /// Episodes reachable from this scope, for derived per-episode values.
    fn episodes(&self) -> Option<Select> {
        match self {
            FileScope::Own(_) => None,
            FileScope::SeasonEpisodes(season_id) => Some(
                Select::from("videodata", "ev")
                    .filter(live_episode("ev"))
                    .filter(col("ev", "season_id").eq(season_id.clone())),
            ),
            FileScope::SeriesEpisodes(series_id) => Some(
                Select::from("videodata", "ev")
                    .join(
                        "season",
                        "es",
                        col("es", "id").eq(col("ev", "season_id")),
                    )
                    .filter(live_episode("ev"))
                    .filter(col("es", "series_id").eq(series_id.clone())),
            ),
        }
    }
}

fn live(alias: &'static str) -> Predicate {
    col(alias, "status").not_eq(Expr::Text(DELETED))
}

fn live_episode(alias: &'static str) -> Predicate {
    col(alias, "episode")
        .cmp(CmpOp::GtEq, Expr::Int(0))
        .and(live(alias))
}

/// Watched state aggregated over episodes: true when every episode with watch
/// data is watched, false when any is not, NULL without data.
fn all_episodes_watched(scope: &FileScope) -> Expr {
    let Some(episodes) = scope.episodes() else {
        return Expr::Null(UnifiedColumn::Watched.kind().null_type());
    };
    let as_flag = Expr::Case {
        when: Box::new(col("ev", "watched").eq(Expr::Bool(true))),
        then: Box::new(Expr::Int(1)),
        otherwise: Box::new(Expr::Int(0)),
    };
    let minimum = episodes
        .value(Expr::func("MIN", vec![as_flag]))
        .filter(col("ev", "watched").is_not_null());
    Expr::subquery(minimum).eq(Expr::Int(1)).into_expr()
}

fn null_of(column: UnifiedColumn) -> Expr {
    Expr::Null(column.kind().null_type())
}

fn null_extra(column: ExtraColumn) -> Expr {
    Expr::Null(column.kind().null_type())
}

/// Column mapping and join path for exactly one entity type.
pub(crate) trait EntitySchema: fmt::Debug + Send + Sync {
    fn metadata_type(&self) -> MetadataType;

    /// `FROM` plus joins, lifecycle filter and type discriminator.
    fn base(&self) -> Select;

    /// Expression for a unified column. `Newest` is always a typed NULL here;
    /// the newest strategy supplies the real value.
    fn column(&self, column: UnifiedColumn) -> Expr;

    /// Expression for an optional column; NULL where the type lacks it.
    fn extra(&self, column: ExtraColumn) -> Expr;

    /// Owner for genre, studio, country, certification, award and boxed-set
    /// lookups.
    fn relation_owner(&self) -> OwnerKey;

    fn rating_owner(&self) -> OwnerKey;

    fn file_scope(&self) -> FileScope;

    fn created(&self) -> Expr;

    fn last_scanned(&self) -> Expr;

    fn id(&self) -> Expr {
        self.column(UnifiedColumn::Id)
    }

    fn year(&self) -> Expr {
        self.column(UnifiedColumn::PublicationYear)
    }

    fn watched(&self) -> Expr {
        self.column(UnifiedColumn::Watched)
    }

    fn sort_title(&self) -> Expr {
        Expr::func(
            "COALESCE",
            vec![
                self.column(UnifiedColumn::SortTitle),
                self.column(UnifiedColumn::Title),
            ],
        )
    }

    fn search_column(&self, field: SearchField) -> Expr {
        match field {
            SearchField::Title => self.column(UnifiedColumn::Title),
            SearchField::OriginalTitle => {
                self.column(UnifiedColumn::OriginalTitle)
            }
            SearchField::SortTitle => self.sort_title(),
        }
    }
}

fn videodata_extra(column: ExtraColumn) -> Expr {
    match column {
        ExtraColumn::Plot => col("vd", "plot"),
        ExtraColumn::Outline => col("vd", "outline"),
        ExtraColumn::Tagline => col("vd", "tagline"),
        ExtraColumn::TopRank => col("vd", "top_rank"),
        ExtraColumn::CreationTimestamp => col("vd", "create_timestamp"),
        ExtraColumn::LastScanned => col("vd", "last_scanned"),
    }
}

fn videodata_shared(column: UnifiedColumn) -> Option<Expr> {
    Some(match column {
        UnifiedColumn::Id => col("vd", "id"),
        UnifiedColumn::Title => col("vd", "title"),
        UnifiedColumn::OriginalTitle => col("vd", "title_original"),
        UnifiedColumn::SortTitle => col("vd", "title_sort"),
        UnifiedColumn::PublicationYear => col("vd", "publication_year"),
        UnifiedColumn::ReleaseDate => col("vd", "release_date"),
        UnifiedColumn::Watched => col("vd", "watched"),
        _ => return None,
    })
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct MovieSchema;

impl EntitySchema for MovieSchema {
    fn metadata_type(&self) -> MetadataType {
        MetadataType::Movie
    }

    fn base(&self) -> Select {
        Select::from("videodata", "vd")
            .filter(live("vd"))
            .filter(col("vd", "episode").cmp(CmpOp::Lt, Expr::Int(0)))
    }

    fn column(&self, column: UnifiedColumn) -> Expr {
        if let Some(expr) = videodata_shared(column) {
            return expr;
        }
        match column {
            UnifiedColumn::MetadataType => Expr::Text("MOVIE"),
            UnifiedColumn::EpisodeNumber => Expr::Int(i64::from(NON_EPISODIC)),
            other => null_of(other),
        }
    }

    fn extra(&self, column: ExtraColumn) -> Expr {
        videodata_extra(column)
    }

    fn relation_owner(&self) -> OwnerKey {
        OwnerKey::videodata(col("vd", "id"))
    }

    fn rating_owner(&self) -> OwnerKey {
        OwnerKey::videodata(col("vd", "id"))
    }

    fn file_scope(&self) -> FileScope {
        FileScope::Own(col("vd", "id"))
    }

    fn created(&self) -> Expr {
        col("vd", "create_timestamp")
    }

    fn last_scanned(&self) -> Expr {
        col("vd", "last_scanned")
    }
}

/// Episodes share the videodata table with movies; series-level relations
/// are inherited through the owning season.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EpisodeSchema;

impl EntitySchema for EpisodeSchema {
    fn metadata_type(&self) -> MetadataType {
        MetadataType::Episode
    }

    fn base(&self) -> Select {
        Select::from("videodata", "vd")
            .join("season", "sea", col("sea", "id").eq(col("vd", "season_id")))
            .filter(live("vd"))
            .filter(
                col("vd", "episode").cmp(CmpOp::GtEq, Expr::Int(0)),
            )
    }

    fn column(&self, column: UnifiedColumn) -> Expr {
        if let Some(expr) = videodata_shared(column) {
            return expr;
        }
        match column {
            UnifiedColumn::MetadataType => Expr::Text("EPISODE"),
            UnifiedColumn::SeriesId => col("sea", "series_id"),
            UnifiedColumn::SeasonId => col("vd", "season_id"),
            UnifiedColumn::SeasonNumber => col("sea", "season"),
            UnifiedColumn::EpisodeNumber => col("vd", "episode"),
            other => null_of(other),
        }
    }

    fn extra(&self, column: ExtraColumn) -> Expr {
        videodata_extra(column)
    }

    fn relation_owner(&self) -> OwnerKey {
        OwnerKey::series(col("sea", "series_id"))
    }

    fn rating_owner(&self) -> OwnerKey {
        OwnerKey::videodata(col("vd", "id"))
    }

    fn file_scope(&self) -> FileScope {
        FileScope::Own(col("vd", "id"))
    }

    fn created(&self) -> Expr {
        col("vd", "create_timestamp")
    }

    fn last_scanned(&self) -> Expr {
        col("vd", "last_scanned")
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SeriesSchema;

impl EntitySchema for SeriesSchema {
    fn metadata_type(&self) -> MetadataType {
        MetadataType::Series
    }

    fn base(&self) -> Select {
        Select::from("series", "ser").filter(live("ser"))
    }

    fn column(&self, column: UnifiedColumn) -> Expr {
        match column {
            UnifiedColumn::Id => col("ser", "id"),
            UnifiedColumn::MetadataType => Expr::Text("SERIES"),
            UnifiedColumn::Title => col("ser", "title"),
            UnifiedColumn::OriginalTitle => col("ser", "title_original"),
            UnifiedColumn::SortTitle => col("ser", "title_sort"),
            UnifiedColumn::PublicationYear => col("ser", "start_year"),
            UnifiedColumn::EpisodeNumber => Expr::Int(i64::from(NON_EPISODIC)),
            UnifiedColumn::Watched => all_episodes_watched(&self.file_scope()),
            other => null_of(other),
        }
    }

    fn extra(&self, column: ExtraColumn) -> Expr {
        match column {
            ExtraColumn::Plot => col("ser", "plot"),
            ExtraColumn::Outline => col("ser", "outline"),
            ExtraColumn::TopRank => col("ser", "top_rank"),
            ExtraColumn::CreationTimestamp => col("ser", "create_timestamp"),
            ExtraColumn::LastScanned => col("ser", "last_scanned"),
            ExtraColumn::Tagline => null_extra(column),
        }
    }

    fn relation_owner(&self) -> OwnerKey {
        OwnerKey::series(col("ser", "id"))
    }

    fn rating_owner(&self) -> OwnerKey {
        OwnerKey::series(col("ser", "id"))
    }

    fn file_scope(&self) -> FileScope {
        FileScope::SeriesEpisodes(col("ser", "id"))
    }

    fn created(&self) -> Expr {
        col("ser", "create_timestamp")
    }

    fn last_scanned(&self) -> Expr {
        col("ser", "last_scanned")
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SeasonSchema;

impl EntitySchema for SeasonSchema {
    fn metadata_type(&self) -> MetadataType {
        MetadataType::Season
    }

    fn base(&self) -> Select {
        Select::from("season", "sea").filter(live("sea"))
    }

    fn column(&self, column: UnifiedColumn) -> Expr {
        match column {
            UnifiedColumn::Id => col("sea", "id"),
            UnifiedColumn::MetadataType => Expr::Text("SEASON"),
            UnifiedColumn::Title => col("sea", "title"),
            UnifiedColumn::OriginalTitle => col("sea", "title_original"),
            UnifiedColumn::SortTitle => col("sea", "title_sort"),
            UnifiedColumn::PublicationYear => col("sea", "publication_year"),
            UnifiedColumn::SeriesId => col("sea", "series_id"),
            UnifiedColumn::SeasonNumber => col("sea", "season"),
            UnifiedColumn::EpisodeNumber => Expr::Int(i64::from(NON_EPISODIC)),
            UnifiedColumn::Watched => all_episodes_watched(&self.file_scope()),
            other => null_of(other),
        }
    }

    fn extra(&self, column: ExtraColumn) -> Expr {
        match column {
            ExtraColumn::Plot => col("sea", "plot"),
            ExtraColumn::Outline => col("sea", "outline"),
            ExtraColumn::CreationTimestamp => col("sea", "create_timestamp"),
            ExtraColumn::LastScanned => col("sea", "last_scanned"),
            ExtraColumn::Tagline | ExtraColumn::TopRank => null_extra(column),
        }
    }

    fn relation_owner(&self) -> OwnerKey {
        OwnerKey::series(col("sea", "series_id"))
    }

    fn rating_owner(&self) -> OwnerKey {
        OwnerKey::series(col("sea", "series_id"))
    }

    fn file_scope(&self) -> FileScope {
        FileScope::SeasonEpisodes(col("sea", "id"))
    }

    fn created(&self) -> Expr {
        col("sea", "create_timestamp")
    }

    fn last_scanned(&self) -> Expr {
        col("sea", "last_scanned")
    }
}

static MOVIE: MovieSchema = MovieSchema;
static EPISODE: EpisodeSchema = EpisodeSchema;
static SERIES: SeriesSchema = SeriesSchema;
static SEASON: SeasonSchema = SeasonSchema;

/// Schema for a video type; artwork-only owner types have none.
pub(crate) fn schema_for(
    metadata_type: MetadataType,
) -> Result<&'static dyn EntitySchema> {
    match metadata_type {
        MetadataType::Movie => Ok(&MOVIE),
        MetadataType::Series => Ok(&SERIES),
        MetadataType::Season => Ok(&SEASON),
        MetadataType::Episode => Ok(&EPISODE),
        MetadataType::Person | MetadataType::BoxedSet => {
            Err(QueryError::UnsupportedEntityType(metadata_type))
        }
    }
}
