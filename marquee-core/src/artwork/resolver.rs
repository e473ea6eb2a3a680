use std::collections::{BTreeMap, HashMap};

use marquee_model::{ArtworkRef, ArtworkType, MetadataType};
use tracing::{debug, instrument, trace, warn};

use crate::compose::union_fragments;
use crate::database::ports::MetadataStore;
use crate::error::{QueryError, QueryPhase, Result};
use crate::fragments::Fragment;
use crate::grouping::group_by_key;
use crate::mapper::{ColumnKind, FlatRow};
use crate::query::ArtworkRequest;
use crate::sql::{
    CmpOp, CompiledQuery, Dialect, Expr, OrderTerm, ParamSet, Predicate,
    Renderer, Select, SqlType, UnionQuery, col,
};

/// Artwork per owner, in the requested located-instance order.
pub type ArtworkMap = HashMap<(MetadataType, i64), Vec<ArtworkRef>>;

/// Located instances in one of these states are never served.
pub const UNUSABLE_LOCATED_STATUSES: [&str; 5] =
    ["INVALID", "NOT_FOUND", "ERROR", "IGNORE", "DELETED"];

/// Output columns of every artwork branch, in projection order.
const COLUMNS: [(&str, ColumnKind); 10] = [
    ("owner_type", ColumnKind::Enum),
    ("owner_id", ColumnKind::Id),
    ("artwork_id", ColumnKind::Id),
    ("artwork_type", ColumnKind::Enum),
    ("located_id", ColumnKind::OptionalId),
    ("language_code", ColumnKind::Text),
    ("located_created", ColumnKind::Timestamp),
    ("generated_id", ColumnKind::OptionalId),
    ("cache_dir", ColumnKind::Text),
    ("cache_filename", ColumnKind::Text),
];

/// How an owner type reaches its artwork slots.
#[derive(Debug, Clone, Copy)]
struct OwnerTable {
    table: &'static str,
    foreign_key: &'static str,
    /// Movies and episodes share `videodata`; the episode sign splits them.
    episode_sign: Option<CmpOp>,
}

const fn owner_table(owner: MetadataType) -> OwnerTable {
    let (table, foreign_key, episode_sign) = match owner {
        MetadataType::Movie => ("videodata", "videodata_id", Some(CmpOp::Lt)),
        MetadataType::Episode => {
            ("videodata", "videodata_id", Some(CmpOp::GtEq))
        }
        MetadataType::Series => ("series", "series_id", None),
        MetadataType::Season => ("season", "season_id", None),
        MetadataType::Person => ("person", "person_id", None),
        MetadataType::BoxedSet => ("boxed_set", "boxedset_id", None),
    };
    OwnerTable {
        table,
        foreign_key,
        episode_sign,
    }
}

/// An artwork union ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtworkQuery {
    /// Owner types that contributed a branch, in canonical order.
    pub owner_types: Vec<MetadataType>,
    pub union: UnionQuery,
    pub params: ParamSet,
}

impl ArtworkQuery {
    pub fn render(&self, dialect: Dialect) -> Result<CompiledQuery> {
        Renderer::new(dialect, &self.params).render_union(&self.union)
    }
}

/// Batched, type-dispatched artwork lookup for already resolved owners.
///
/// One branch per non-empty owner bucket, all unioned into a single
/// round-trip:
///
/// ```text
/// owner o -> artwork a
///   -> artwork_located l (left)
///   -> artwork_generated g (left)
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArtworkResolver {
    default_profile: Option<String>,
}

impl ArtworkResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendition profile used when a request names none.
    pub fn with_default_profile(mut self, profile: Option<String>) -> Self {
        self.default_profile = profile;
        self
    }

    /// Builds the artwork union, or `None` when there is nothing to look up.
    ///
    /// Buckets without ids emit no branch at all.
    pub fn compose(
        &self,
        owners: &BTreeMap<MetadataType, Vec<i64>>,
        request: &ArtworkRequest,
    ) -> Option<ArtworkQuery> {
        if request.types.is_empty() {
            return None;
        }
        let profile = request
            .profile
            .as_deref()
            .or(self.default_profile.as_deref());

        let fragments: Vec<Fragment> = owners
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(owner, ids)| branch(*owner, ids, request, profile))
            .collect();
        if fragments.is_empty() {
            return None;
        }

        let (mut union, params, owner_types) = union_fragments(fragments);
        union.order_by = vec![
            OrderTerm {
                expr: UnionQuery::output("located_created"),
                order: request.order,
                nulls_last: true,
            },
            OrderTerm {
                expr: UnionQuery::output("located_id"),
                order: request.order,
                nulls_last: true,
            },
        ];
        Some(ArtworkQuery {
            owner_types,
            union,
            params,
        })
    }

    /// Resolves artwork for `owners` in one store round-trip.
    ///
    /// Owners without a usable located instance are absent from the map. Any
    /// store failure aborts the whole resolution.
    #[instrument(
        skip_all,
        fields(
            owners = owners.values().map(Vec::len).sum::<usize>(),
            artwork_types = ?request.types,
        )
    )]
    pub async fn resolve<S>(
        &self,
        store: &S,
        owners: &BTreeMap<MetadataType, Vec<i64>>,
        request: &ArtworkRequest,
    ) -> Result<ArtworkMap>
    where
        S: MetadataStore + ?Sized,
    {
        let Some(query) = self.compose(owners, request) else {
            trace!("no artwork owners to resolve");
            return Ok(ArtworkMap::new());
        };

        let compiled = query.render(store.dialect())?;
        debug!(
            sql = %compiled.sql,
            params = compiled.params.len(),
            branches = query.owner_types.len(),
            "resolving artwork"
        );

        let kinds: Vec<ColumnKind> =
            COLUMNS.iter().map(|(_, kind)| *kind).collect();
        let rows = store.fetch(&compiled, &kinds).await.map_err(|err| {
            warn!(error = %err, "artwork query failed");
            QueryError::store(QueryPhase::Artwork)(err)
        })?;

        let mut references = Vec::with_capacity(rows.len());
        for row in &rows {
            match map_row(row)? {
                Some(reference) => references.push(reference),
                None => {
                    trace!("dropping artwork slot without a located instance")
                }
            }
        }
        debug!(
            rows = rows.len(),
            located = references.len(),
            "artwork resolved"
        );

        Ok(group_by_key(references, |reference| {
            (reference.owner_type, reference.owner_id)
        }))
    }
}

fn branch(
    owner: MetadataType,
    ids: &[i64],
    request: &ArtworkRequest,
    profile: Option<&str>,
) -> Fragment {
    let table = owner_table(owner);
    let mut params = ParamSet::new();

    let owner_ids = ids
        .iter()
        .map(|id| params.bind("owner_id", *id))
        .collect();
    let artwork_types = request
        .types
        .iter()
        .map(|kind| params.bind("artwork_type", kind.as_str()))
        .collect();
    let unusable =
        UNUSABLE_LOCATED_STATUSES.into_iter().map(Expr::Text).collect();

    let mut select = Select::from(table.table, "o")
        .column(Expr::Text(owner.as_str()), "owner_type")
        .column(col("o", "id"), "owner_id")
        .column(col("a", "id"), "artwork_id")
        .column(col("a", "artwork_type"), "artwork_type")
        .column(col("l", "id"), "located_id")
        .column(col("l", "language_code"), "language_code")
        .column(col("l", "create_timestamp"), "located_created");

    select = match profile {
        Some(profile) => {
            let profile = params.bind("profile", profile);
            select
                .column(col("g", "id"), "generated_id")
                .column(col("g", "cache_dir"), "cache_dir")
                .column(col("g", "cache_filename"), "cache_filename")
                .join("artwork", "a", artwork_join(table))
                .left_join("artwork_located", "l", located_join(unusable))
                .left_join(
                    "artwork_generated",
                    "g",
                    col("g", "located_id")
                        .eq(col("l", "id"))
                        .and(col("g", "profile").eq(profile)),
                )
        }
        // No profile: nothing can be cached, so skip the rendition join.
        None => select
            .column(Expr::Null(SqlType::BigInt), "generated_id")
            .column(Expr::Null(SqlType::Text), "cache_dir")
            .column(Expr::Null(SqlType::Text), "cache_filename")
            .join("artwork", "a", artwork_join(table))
            .left_join("artwork_located", "l", located_join(unusable)),
    };

    select = select
        .filter(col("o", "id").in_list(owner_ids))
        .filter(col("a", "artwork_type").in_list(artwork_types));
    if let Some(sign) = table.episode_sign {
        select = select.filter(col("o", "episode").cmp(sign, Expr::Int(0)));
    }

    Fragment {
        metadata_type: owner,
        select,
        params,
    }
}

fn artwork_join(table: OwnerTable) -> Predicate {
    col("a", table.foreign_key).eq(col("o", "id"))
}

fn located_join(unusable: Vec<Expr>) -> Predicate {
    col("l", "artwork_id")
        .eq(col("a", "id"))
        .and(col("l", "status").not_in_list(unusable))
}

/// `None` for artwork slots that have no usable located instance.
fn map_row(row: &FlatRow) -> Result<Option<ArtworkRef>> {
    if row.len() != COLUMNS.len() {
        return Err(QueryError::RowMapping(format!(
            "artwork row has {} columns, expected {}",
            row.len(),
            COLUMNS.len()
        )));
    }
    let name = |index: usize| COLUMNS[index].0;

    let Some(located_id) = row.opt_i64(4, name(4))? else {
        return Ok(None);
    };
    let owner_type = MetadataType::parse(&row.text(0, name(0))?)
        .map_err(|err| QueryError::RowMapping(err.to_string()))?;
    let artwork_type = ArtworkType::parse(&row.text(3, name(3))?)
        .map_err(|err| QueryError::RowMapping(err.to_string()))?;

    Ok(Some(ArtworkRef {
        owner_id: row.i64(1, name(1))?,
        owner_type,
        artwork_id: row.i64(2, name(2))?,
        artwork_type,
        located_id,
        language_code: row.opt_text(5, name(5))?,
        located_at: row.opt_timestamp(6, name(6))?,
        generated_id: row.opt_i64(7, name(7))?,
        cache_dir: row.opt_text(8, name(8))?,
        cache_filename: row.opt_text(9, name(9))?,
    }))
}
