//! Set union of per-type fragments with one shared sort, page and parameter
//! set.

use marquee_model::{MetadataType, SortOrder};
use tracing::trace;

use crate::error::Result;
use crate::fragments::{Fragment, FragmentBuilder, NewestStrategy};
use crate::mapper::UnifiedColumn;
use crate::query::{FilterCriteria, NewestSource, SortField};
use crate::sql::{
    CompiledQuery, Dialect, Expr, OrderTerm, ParamSet, Renderer,
    UnionProjection, UnionQuery,
};

/// Page size bounds applied to every composed listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_size: u32,
    pub max_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: 50,
            max_size: 500,
        }
    }
}

impl PageLimits {
    /// Requested limit, defaulted and clamped to `1..=max_size`.
    pub fn clamp(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_size)
            .clamp(1, self.max_size.max(1))
    }
}

/// A union ready to render, together with its merged parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedQuery {
    pub types: Vec<MetadataType>,
    pub union: UnionQuery,
    pub params: ParamSet,
}

impl ComposedQuery {
    pub fn render(&self, dialect: Dialect) -> Result<CompiledQuery> {
        Renderer::new(dialect, &self.params).render_union(&self.union)
    }

    /// `COUNT(*)` over the same union, without order or paging.
    pub fn render_count(&self, dialect: Dialect) -> Result<CompiledQuery> {
        let mut count = self.union.clone();
        count.projection = UnionProjection::Count;
        count.order_by.clear();
        count.limit = None;
        count.offset = None;
        Renderer::new(dialect, &self.params).render_union(&count)
    }
}

/// Merges fragments into one union, namespacing conflicting parameters.
///
/// Fragments arrive in canonical type order; each one's parameters are merged
/// under the lowercase type name.
pub fn union_fragments(
    fragments: Vec<Fragment>,
) -> (UnionQuery, ParamSet, Vec<MetadataType>) {
    let mut params = ParamSet::new();
    let mut branches = Vec::with_capacity(fragments.len());
    let mut types = Vec::with_capacity(fragments.len());

    for fragment in fragments {
        let namespace = fragment.metadata_type.as_str().to_ascii_lowercase();
        let merge = params.merge(&fragment.params, &namespace);
        let mut select = fragment.select;
        if !merge.renames.is_empty() {
            trace!(
                metadata_type = %fragment.metadata_type,
                renamed = merge.renames.len(),
                "namespacing fragment parameters"
            );
            select.rename_params(&merge.renames);
        }
        params = merge.params;
        branches.push(select);
        types.push(fragment.metadata_type);
    }

    (UnionQuery::new(branches), params, types)
}

/// Builds the unified listing query for one request.
#[derive(Debug, Clone, Copy)]
pub struct QueryComposer<'a> {
    criteria: &'a FilterCriteria,
    newest_fallback: NewestSource,
    limits: PageLimits,
}

impl<'a> QueryComposer<'a> {
    pub fn new(criteria: &'a FilterCriteria) -> Self {
        Self {
            criteria,
            newest_fallback: NewestSource::default(),
            limits: PageLimits::default(),
        }
    }

    pub fn with_newest_fallback(mut self, source: NewestSource) -> Self {
        self.newest_fallback = source;
        self
    }

    pub fn with_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    /// The strategy every fragment of this query shares.
    pub fn newest_strategy(&self) -> Option<NewestStrategy> {
        NewestStrategy::select(self.criteria, self.newest_fallback)
    }

    /// Validates the criteria and composes the union for the requested types.
    ///
    /// Returns `Ok(None)` when no type is requested: an empty listing that
    /// needs no round-trip.
    pub fn compose(&self) -> Result<Option<ComposedQuery>> {
        self.criteria.validate()?;
        if self.criteria.types.is_empty() {
            return Ok(None);
        }

        let builder =
            FragmentBuilder::new(self.criteria, self.newest_strategy());
        let fragments = self
            .criteria
            .types
            .iter()
            .map(|metadata_type| builder.build(*metadata_type))
            .collect::<Result<Vec<_>>>()?;

        let (mut union, mut params, types) = union_fragments(fragments);
        union.order_by = order_terms(self.criteria);

        let pagination = &self.criteria.pagination;
        let limit = self.limits.clamp(pagination.limit);
        union.limit = Some(params.bind("limit", i64::from(limit)));
        if pagination.offset > 0 {
            union.offset =
                Some(params.bind("offset", i64::from(pagination.offset)));
        }

        Ok(Some(ComposedQuery {
            types,
            union,
            params,
        }))
    }
}

fn order_terms(criteria: &FilterCriteria) -> Vec<OrderTerm> {
    let output = |column: UnifiedColumn| UnionQuery::output(column.alias());
    let order = criteria.sort.order;
    let primary = match criteria.sort.field {
        SortField::Title => output(UnifiedColumn::Title).lower(),
        SortField::SortTitle => Expr::func(
            "COALESCE",
            vec![
                output(UnifiedColumn::SortTitle),
                output(UnifiedColumn::Title),
            ],
        )
        .lower(),
        SortField::OriginalTitle => {
            output(UnifiedColumn::OriginalTitle).lower()
        }
        SortField::Year => output(UnifiedColumn::PublicationYear),
        SortField::ReleaseDate => output(UnifiedColumn::ReleaseDate),
        SortField::Newest => output(UnifiedColumn::Newest),
        SortField::Id => output(UnifiedColumn::Id),
        SortField::Random => Expr::func("RANDOM", Vec::new()),
    };

    let mut terms = vec![
        OrderTerm {
            expr: primary,
            order,
            nulls_last: criteria.sort.field != SortField::Random,
        },
        OrderTerm {
            expr: output(UnifiedColumn::MetadataType),
            order: SortOrder::Ascending,
            nulls_last: false,
        },
    ];
    if criteria.sort.field != SortField::Id {
        terms.push(OrderTerm {
            expr: output(UnifiedColumn::Id),
            order,
            nulls_last: false,
        });
    }
    terms
}
