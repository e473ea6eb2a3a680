//! Typed listing criteria and the fluent builder that produces them.

pub mod builder;
pub mod criteria;
pub mod types;

pub use builder::CriteriaBuilder;
pub use criteria::FilterCriteria;
pub use types::{
    ArtworkRequest, ExtraColumn, Facet, LookupKey, NewestFilter, NewestSource,
    Pagination, Polarity, RatingFilter, RatingSource, Resolution, SearchField,
    SearchMode, SearchQuery, SortField, SortSpec, YearRange,
};
