//! Distinct letter, year and decade listings.
//!
//! These reuse the per-type fragments and facet predicates of the unified
//! listing with a single `value` column instead of the unified row. The union
//! removes duplicates across types; there is no paging and no artwork phase.

use marquee_model::SortOrder;

use crate::compose::union_fragments;
use crate::error::Result;
use crate::fragments::{FragmentBuilder, NewestStrategy};
use crate::mapper::ColumnKind;
use crate::query::{FilterCriteria, NewestSource};
use crate::sql::{
    ArithOp, CompiledQuery, Dialect, Expr, OrderTerm, ParamSet, Renderer,
    UnionQuery,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    /// Upper-cased first character of the sort title, falling back to the
    /// title.
    Letters,
    Years,
    /// Years truncated to their decade (`1994` -> `1990`).
    Decades,
}

impl AggregateKind {
    pub const fn column_kind(&self) -> ColumnKind {
        match self {
            AggregateKind::Letters => ColumnKind::Text,
            AggregateKind::Years | AggregateKind::Decades => {
                ColumnKind::Integer
            }
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            AggregateKind::Letters => "letters",
            AggregateKind::Years => "years",
            AggregateKind::Decades => "decades",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateQuery {
    pub kind: AggregateKind,
    pub union: UnionQuery,
    pub params: ParamSet,
}

impl AggregateQuery {
    pub fn render(&self, dialect: Dialect) -> Result<CompiledQuery> {
        Renderer::new(dialect, &self.params).render_union(&self.union)
    }
}

/// Validates the criteria and composes the one-column union for `kind`, or
/// `None` when no type is requested.
pub fn compose_aggregate(
    criteria: &FilterCriteria,
    kind: AggregateKind,
    newest_fallback: NewestSource,
) -> Result<Option<AggregateQuery>> {
    criteria.validate()?;
    if criteria.types.is_empty() {
        return Ok(None);
    }

    let builder = FragmentBuilder::new(
        criteria,
        NewestStrategy::select(criteria, newest_fallback),
    );
    let fragments = criteria
        .types
        .iter()
        .map(|metadata_type| {
            builder.build_value(*metadata_type, |schema| match kind {
                AggregateKind::Letters => Expr::func(
                    "UPPER",
                    vec![Expr::func(
                        "SUBSTR",
                        vec![schema.sort_title(), Expr::Int(1), Expr::Int(1)],
                    )],
                ),
                AggregateKind::Years => schema.year(),
                AggregateKind::Decades => schema
                    .year()
                    .arith(ArithOp::Div, Expr::Int(10))
                    .arith(ArithOp::Mul, Expr::Int(10)),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let (mut union, params, _) = union_fragments(fragments);
    union.order_by = vec![OrderTerm {
        expr: UnionQuery::output("value"),
        order: SortOrder::Ascending,
        nulls_last: false,
    }];
    Ok(Some(AggregateQuery {
        kind,
        union,
        params,
    }))
}
