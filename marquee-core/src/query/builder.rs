use chrono::{DateTime, Utc};
use marquee_model::{ArtworkType, MetadataType, SortOrder};

use super::criteria::FilterCriteria;
use super::types::*;
use crate::error::Result;

/// Fluent API for building listing criteria
#[derive(Debug, Clone, Default)]
pub struct CriteriaBuilder {
    criteria: FilterCriteria,
}

impl CriteriaBuilder {
    /// Create a new criteria builder
    pub fn new() -> Self {
        Self::default()
    }

    // === Type selection ===

    /// Add one entity type to the union
    pub fn with_type(mut self, metadata_type: MetadataType) -> Self {
        self.criteria.types.insert(metadata_type);
        self
    }

    /// Replace the requested entity types
    pub fn types(
        mut self,
        types: impl IntoIterator<Item = MetadataType>,
    ) -> Self {
        self.criteria.types = types.into_iter().collect();
        self
    }

    /// Request every video type
    pub fn all_video_types(self) -> Self {
        self.types(marquee_model::VIDEO_TYPES)
    }

    // === Facets ===

    pub fn ids(mut self, polarity: Polarity, ids: Vec<i64>) -> Self {
        self.criteria.id = Facet::new(polarity, ids);
        self
    }

    pub fn year(mut self, polarity: Polarity, year: i32) -> Self {
        self.criteria.year_exact = Facet::new(polarity, year);
        self
    }

    /// Filter by inclusive year range
    pub fn year_range(mut self, start: i32, end: i32) -> Self {
        self.criteria.year_range =
            Facet::Include(YearRange::new(start, end));
        self
    }

    pub fn exclude_year_range(mut self, start: i32, end: i32) -> Self {
        self.criteria.year_range =
            Facet::Exclude(YearRange::new(start, end));
        self
    }

    /// Filter by watched flag
    pub fn watched(mut self, polarity: Polarity, watched: bool) -> Self {
        self.criteria.watched = Facet::new(polarity, watched);
        self
    }

    /// Filter by genre name
    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.criteria.genre = Facet::Include(genre.into());
        self
    }

    pub fn exclude_genre(mut self, genre: impl Into<String>) -> Self {
        self.criteria.genre = Facet::Exclude(genre.into());
        self
    }

    /// Filter by studio id or name
    pub fn studio(
        mut self,
        polarity: Polarity,
        studio: impl Into<LookupKey>,
    ) -> Self {
        self.criteria.studio = Facet::new(polarity, studio.into());
        self
    }

    /// Filter by country code
    pub fn country(
        mut self,
        polarity: Polarity,
        code: impl Into<String>,
    ) -> Self {
        self.criteria.country = Facet::new(polarity, code.into());
        self
    }

    pub fn certification(
        mut self,
        polarity: Polarity,
        certification: impl Into<LookupKey>,
    ) -> Self {
        self.criteria.certification =
            Facet::new(polarity, certification.into());
        self
    }

    pub fn award(
        mut self,
        polarity: Polarity,
        award: impl Into<LookupKey>,
    ) -> Self {
        self.criteria.award = Facet::new(polarity, award.into());
        self
    }

    pub fn video_source(
        mut self,
        polarity: Polarity,
        source: impl Into<String>,
    ) -> Self {
        self.criteria.video_source = Facet::new(polarity, source.into());
        self
    }

    pub fn resolution(
        mut self,
        polarity: Polarity,
        resolution: Resolution,
    ) -> Self {
        self.criteria.resolution = Facet::new(polarity, resolution);
        self
    }

    /// Filter by one source's rounded rating bucket
    pub fn rating(
        mut self,
        polarity: Polarity,
        source: impl AsRef<str>,
        value: i32,
    ) -> Self {
        self.criteria.rating = Facet::new(
            polarity,
            RatingFilter {
                source: Some(RatingSource::parse(source.as_ref())),
                value,
            },
        );
        self
    }

    /// Filter by the rounded average over all rating sources
    pub fn combined_rating(mut self, polarity: Polarity, value: i32) -> Self {
        self.criteria.rating = Facet::new(
            polarity,
            RatingFilter {
                source: Some(RatingSource::Combined),
                value,
            },
        );
        self
    }

    /// Filter by recency relative to `threshold`
    pub fn newest(
        mut self,
        polarity: Polarity,
        source: NewestSource,
        threshold: DateTime<Utc>,
    ) -> Self {
        self.criteria.newest =
            Facet::new(polarity, NewestFilter { source, threshold });
        self
    }

    pub fn boxed_set(mut self, polarity: Polarity, boxed_set_id: i64) -> Self {
        self.criteria.boxed_set = Facet::new(polarity, boxed_set_id);
        self
    }

    // === Search ===

    /// Add title search; blank text clears the search
    pub fn search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.criteria.search = if text.trim().is_empty() {
            None
        } else {
            Some(SearchQuery::new(text))
        };
        self
    }

    /// Add search on a specific title field with a specific match mode
    pub fn search_in(
        mut self,
        text: impl Into<String>,
        field: SearchField,
        mode: SearchMode,
    ) -> Self {
        let text = text.into();
        self.criteria.search = if text.trim().is_empty() {
            None
        } else {
            Some(SearchQuery { text, field, mode })
        };
        self
    }

    // === Sort ===

    /// Set sort field and order
    pub fn sort_by(mut self, field: SortField, order: SortOrder) -> Self {
        self.criteria.sort = SortSpec { field, order };
        self
    }

    /// Convenience for "recently added"
    pub fn newest_first(self) -> Self {
        self.sort_by(SortField::Newest, SortOrder::Descending)
    }

    // === Pagination ===

    /// Set result limit
    pub fn limit(mut self, limit: u32) -> Self {
        self.criteria.pagination.limit = Some(limit);
        self
    }

    /// Set result offset
    pub fn offset(mut self, offset: u32) -> Self {
        self.criteria.pagination.offset = offset;
        self
    }

    /// Also compute the total number of matching rows
    pub fn with_total(mut self) -> Self {
        self.criteria.pagination.with_total = true;
        self
    }

    // === Projection ===

    pub fn extra(mut self, column: ExtraColumn) -> Self {
        self.criteria.extras.insert(column);
        self
    }

    pub fn extras(
        mut self,
        columns: impl IntoIterator<Item = ExtraColumn>,
    ) -> Self {
        self.criteria.extras.extend(columns);
        self
    }

    /// Attach artwork of the given types to the resolved rows
    pub fn artwork(
        mut self,
        types: impl IntoIterator<Item = ArtworkType>,
    ) -> Self {
        self.criteria.artwork = Some(ArtworkRequest::new(types));
        self
    }

    pub fn artwork_request(mut self, request: ArtworkRequest) -> Self {
        self.criteria.artwork = Some(request);
        self
    }

    /// Build and validate the criteria
    pub fn build(self) -> Result<FilterCriteria> {
        self.criteria.validate()?;
        Ok(self.criteria)
    }

    /// Build without validation
    pub fn build_unchecked(self) -> FilterCriteria {
        self.criteria
    }
}
