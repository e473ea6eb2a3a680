use std::collections::BTreeSet;

use marquee_model::MetadataType;
use serde::{Deserialize, Serialize};

use super::types::{
    ArtworkRequest, ExtraColumn, Facet, LookupKey, NewestFilter, Pagination,
    RatingFilter, Resolution, SearchQuery, SortField, SortSpec, YearRange,
};
use crate::error::{QueryError, Result};

/// Normalized options of one listing request.
///
/// Every facet is a tri-state [`Facet`]; facets are independent and any
/// subset may be active in any polarity. Built once per request (usually via
/// [`CriteriaBuilder`](super::CriteriaBuilder)) and never mutated while a
/// query runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    /// Requested entity types. Iteration order is the canonical union order.
    pub types: BTreeSet<MetadataType>,

    pub id: Facet<Vec<i64>>,
    pub year_exact: Facet<i32>,
    pub year_range: Facet<YearRange>,
    pub watched: Facet<bool>,
    pub genre: Facet<String>,
    pub studio: Facet<LookupKey>,
    pub country: Facet<String>,
    pub certification: Facet<LookupKey>,
    pub award: Facet<LookupKey>,
    pub video_source: Facet<String>,
    pub resolution: Facet<Resolution>,
    pub rating: Facet<RatingFilter>,
    pub newest: Facet<NewestFilter>,
    pub boxed_set: Facet<i64>,

    pub search: Option<SearchQuery>,
    pub sort: SortSpec,
    pub pagination: Pagination,
    pub extras: BTreeSet<ExtraColumn>,
    pub artwork: Option<ArtworkRequest>,
}

impl FilterCriteria {
    /// Rejects combinations that cannot be turned into a query.
    ///
    /// Runs before any SQL is built. An empty type set is valid and yields an
    /// empty result.
    pub fn validate(&self) -> Result<()> {
        if let Some(unsupported) = self.types.iter().find(|ty| !ty.is_video()) {
            return Err(QueryError::UnsupportedEntityType(*unsupported));
        }

        if let Some(ids) = self.id.value()
            && ids.is_empty()
        {
            return Err(QueryError::invalid(
                "id facet requires at least one id",
            ));
        }

        if let Some(range) = self.year_range.value()
            && range.start > range.end
        {
            return Err(QueryError::invalid(format!(
                "year range start {} is after end {}",
                range.start, range.end
            )));
        }

        for (facet, value) in [
            ("genre", self.genre.value()),
            ("country", self.country.value()),
            ("video source", self.video_source.value()),
        ] {
            if value.is_some_and(|value| value.trim().is_empty()) {
                return Err(QueryError::invalid(format!(
                    "{facet} facet requires a value"
                )));
            }
        }

        for (facet, value) in [
            ("studio", self.studio.value()),
            ("certification", self.certification.value()),
            ("award", self.award.value()),
        ] {
            if let Some(LookupKey::Name(name)) = value
                && name.trim().is_empty()
            {
                return Err(QueryError::invalid(format!(
                    "{facet} facet requires an id or a name"
                )));
            }
        }

        if let Some(rating) = self.rating.value() {
            if rating.source.is_none() {
                return Err(QueryError::invalid(
                    "rating facet requires a rating source",
                ));
            }
            if !(0..=10).contains(&rating.value) {
                return Err(QueryError::invalid(format!(
                    "rating {} is outside 0..=10",
                    rating.value
                )));
            }
        }

        Ok(())
    }

    /// Whether the derived `newest` value must be computed for this request.
    pub fn needs_newest(&self) -> bool {
        self.newest.is_set() || self.sort.field == SortField::Newest
    }

    pub fn wants_artwork(&self) -> bool {
        self.artwork
            .as_ref()
            .is_some_and(|request| !request.types.is_empty())
    }
}
