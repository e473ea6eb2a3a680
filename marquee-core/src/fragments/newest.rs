//! Recency source for the derived `newest` value.
//!
//! The strategy is picked once per query. The same [`NewestStrategy::value`]
//! expression feeds both the projected `newest` column and the newest facet
//! predicate, so the two cannot drift apart.

use chrono::{DateTime, Utc};

use super::schema::{EntitySchema, FileScope};
use crate::query::{FilterCriteria, NewestSource, Polarity};
use crate::sql::{CmpOp, Expr, ParamSet, Predicate, col};

/// Stage file statuses that never count as an observed file date.
const IGNORED_FILE_STATUSES: [&str; 3] = ["DELETED", "INVALID", "DUPLICATE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewestStrategy {
    source: NewestSource,
}

impl NewestStrategy {
    pub const fn new(source: NewestSource) -> Self {
        Self { source }
    }

    /// Strategy for a request, or `None` when nothing needs the value.
    ///
    /// An explicit newest facet decides the source; otherwise `fallback` is
    /// used when sorting by newest.
    pub fn select(
        criteria: &FilterCriteria,
        fallback: NewestSource,
    ) -> Option<Self> {
        if let Some(filter) = criteria.newest.value() {
            return Some(Self::new(filter.source));
        }
        criteria.needs_newest().then(|| Self::new(fallback))
    }

    pub const fn source(&self) -> NewestSource {
        self.source
    }

    /// The row's newest value, in comparable form.
    pub(crate) fn value(
        &self,
        schema: &dyn EntitySchema,
        params: &mut ParamSet,
    ) -> Expr {
        match self.source {
            NewestSource::Creation => schema.created().instant(),
            NewestSource::LastScan => schema.last_scanned().instant(),
            NewestSource::FileDate => {
                latest_file_date(&schema.file_scope(), params)
            }
        }
    }

    /// Facet predicate comparing the newest value against `threshold`.
    ///
    /// Last-scan is asymmetric: an unscanned row satisfies include and never
    /// satisfies exclude.
    pub(crate) fn predicate(
        &self,
        schema: &dyn EntitySchema,
        polarity: Polarity,
        threshold: DateTime<Utc>,
        params: &mut ParamSet,
    ) -> Predicate {
        let value = self.value(schema, params);
        let threshold = params.bind("newest", threshold).instant();
        match (self.source, polarity) {
            (NewestSource::LastScan, Polarity::Include) => value
                .clone()
                .is_null()
                .or(value.cmp(CmpOp::GtEq, threshold)),
            (NewestSource::LastScan, Polarity::Exclude) => value
                .clone()
                .is_not_null()
                .and(value.cmp(CmpOp::Lt, threshold)),
            (_, Polarity::Include) => value.cmp(CmpOp::GtEq, threshold),
            (_, Polarity::Exclude) => value.cmp(CmpOp::Lt, threshold),
        }
    }
}

/// Scalar subquery: latest file date over the scope's non-extra video files
/// that are not in an ignored status.
fn latest_file_date(scope: &FileScope, params: &mut ParamSet) -> Expr {
    let extra = params.bind("extra", false);
    let latest = scope
        .mediafiles()
        .join(
            "stage_file",
            "sf",
            col("sf", "mediafile_id").eq(col("mf", "id")),
        )
        .value(Expr::func("MAX", vec![col("sf", "file_date").instant()]))
        .filter(col("mf", "extra").eq(extra))
        .filter(col("sf", "file_type").eq(Expr::Text("VIDEO")))
        .filter(
            col("sf", "status").not_in_list(
                IGNORED_FILE_STATUSES.into_iter().map(Expr::Text).collect(),
            ),
        );
    Expr::subquery(latest)
}
