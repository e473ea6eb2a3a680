//! Per-entity-type query fragments.
//!
//! A fragment is one union branch: the entity's base relation projected into
//! the unified column list, with one predicate per active facet. Building a
//! fragment is pure; it returns the branch together with its own parameter
//! set and never touches shared state.

pub(crate) mod facets;
pub mod newest;
pub(crate) mod schema;

use marquee_model::MetadataType;

use crate::error::Result;
use crate::mapper::UnifiedColumn;
use crate::query::FilterCriteria;
use crate::sql::{Expr, ParamSet, Select};

use facets::FacetPredicates;
pub use newest::NewestStrategy;
use schema::{EntitySchema, schema_for};

/// One union branch and the parameters it binds.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub metadata_type: MetadataType,
    pub select: Select,
    pub params: ParamSet,
}

/// Builds fragments for one request.
#[derive(Debug, Clone, Copy)]
pub struct FragmentBuilder<'a> {
    criteria: &'a FilterCriteria,
    newest: Option<NewestStrategy>,
}

impl<'a> FragmentBuilder<'a> {
    /// `newest` is the strategy selected once for the whole query. An active
    /// newest facet always brings its own source.
    pub fn new(
        criteria: &'a FilterCriteria,
        newest: Option<NewestStrategy>,
    ) -> Self {
        let newest = match criteria.newest.value() {
            Some(filter) => Some(NewestStrategy::new(filter.source)),
            None => newest,
        };
        Self { criteria, newest }
    }

    /// Unified-row fragment for `metadata_type`.
    pub fn build(&self, metadata_type: MetadataType) -> Result<Fragment> {
        let schema = schema_for(metadata_type)?;
        let mut params = ParamSet::new();
        let mut select = schema.base();

        for column in UnifiedColumn::ALL {
            let expr = match (column, self.newest) {
                (UnifiedColumn::Newest, Some(strategy)) => {
                    strategy.value(schema, &mut params)
                }
                _ => schema.column(column),
            };
            select = select.column(expr, column.alias());
        }
        for extra in &self.criteria.extras {
            select = select.column(schema.extra(*extra), extra.alias());
        }

        let select = self.filtered(schema, select, &mut params)?;
        Ok(Fragment {
            metadata_type,
            select,
            params,
        })
    }

    /// Fragment projecting a single `value` column, for aggregate listings.
    ///
    /// `project` receives the schema so each type can supply its own
    /// expression. Rows without a value are filtered out.
    pub(crate) fn build_value(
        &self,
        metadata_type: MetadataType,
        project: impl Fn(&dyn EntitySchema) -> Expr,
    ) -> Result<Fragment> {
        let schema = schema_for(metadata_type)?;
        let mut params = ParamSet::new();
        let value = project(schema);
        let select = schema
            .base()
            .column(value.clone(), "value")
            .filter(value.is_not_null());
        let select = self.filtered(schema, select, &mut params)?;
        Ok(Fragment {
            metadata_type,
            select,
            params,
        })
    }

    fn filtered(
        &self,
        schema: &dyn EntitySchema,
        select: Select,
        params: &mut ParamSet,
    ) -> Result<Select> {
        FacetPredicates {
            criteria: self.criteria,
            newest: self.newest,
        }
        .apply(schema, select, params)
    }
}
