//! # Marquee Core
//!
//! Faceted, cross-type metadata query engine for a media library.
//!
//! ## Overview
//!
//! Movies, series, seasons and episodes live in structurally different
//! relations. `marquee-core` projects all of them into one
//! [`UnifiedVideoRow`](marquee_model::UnifiedVideoRow) shape:
//!
//! - **Fragments**: one `SELECT` per entity type, each projecting the same
//!   ordered column list and carrying one predicate per active facet
//! - **Composition**: fragments are unioned, share one parameter set, and are
//!   sorted and paged once over the union
//! - **Artwork**: a second, batched round-trip attaches located artwork and
//!   cached renditions to the resolved rows
//! - **Aggregates**: distinct letters, years and decades over the same
//!   fragments
//!
//! Queries are built as a typed IR ([`sql`]) and rendered once per store
//! dialect; caller input only ever reaches SQL as a bound parameter.
//!
//! ## Architecture
//!
//! - [`query`]: typed criteria and the [`CriteriaBuilder`]
//! - [`sql`]: IR, parameter sets and the dialect renderer
//! - [`fragments`]: per-type fragment builders and the newest strategy
//! - [`compose`]: union composition, ordering and paging
//! - [`mapper`]: explicit column-to-field mapping for unified rows
//! - [`artwork`]: artwork resolution and language priority
//! - [`database`]: the [`MetadataStore`] port and its Postgres/SQLite adapters
//! - [`service`]: [`VideoQueryService`], the request entry point
//!
//! ## Example
//!
//! ```no_run
//! use marquee_core::{
//!     CriteriaBuilder, EngineSettings, PostgresMetadataStore,
//!     VideoQueryService, query::Polarity,
//! };
//! use marquee_model::{ArtworkType, MetadataType};
//!
//! # async fn run(pool: sqlx::PgPool) -> marquee_core::Result<()> {
//! let service = VideoQueryService::new(
//!     PostgresMetadataStore::new(pool),
//!     EngineSettings::default(),
//! );
//! let criteria = CriteriaBuilder::new()
//!     .types([MetadataType::Movie, MetadataType::Series])
//!     .genre("Action")
//!     .year_range(2000, 2010)
//!     .watched(Polarity::Exclude, true)
//!     .artwork([ArtworkType::Poster])
//!     .limit(25)
//!     .build()?;
//! let page = service.list(&criteria).await?;
//! for item in &page.items {
//!     println!("{:?} {}", item.row.title, item.artwork.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregates;
pub mod artwork;
pub mod compose;
pub mod database;
pub mod error;
pub mod fragments;
pub mod grouping;
pub mod mapper;
pub mod query;
pub mod service;
pub mod sql;

pub use aggregates::{AggregateKind, AggregateQuery, compose_aggregate};
pub use artwork::{ArtworkMap, ArtworkQuery, ArtworkResolver, LanguagePriority};
pub use compose::{ComposedQuery, PageLimits, QueryComposer, union_fragments};
pub use database::{MetadataStore, PostgresMetadataStore, SqliteMetadataStore};
pub use error::{QueryError, QueryPhase, Result};
pub use fragments::{Fragment, FragmentBuilder, NewestStrategy};
pub use mapper::{
    ColumnKind, ColumnValue, FlatRow, UnifiedColumn, VideoRowMapper,
};
pub use query::{CriteriaBuilder, FilterCriteria};
pub use service::{EngineSettings, VideoItem, VideoPage, VideoQueryService};
pub use sql::{CompiledQuery, Dialect};
