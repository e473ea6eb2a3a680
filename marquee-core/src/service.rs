//! Request orchestration: validate, compose, fetch rows, attach artwork.
//!
//! At most two sequential store round-trips per listing (rows, then
//! artwork), plus an optional count. Nothing is shared between calls except
//! the store handle, so one service can serve concurrent requests.

use std::collections::BTreeMap;

use marquee_model::{ArtworkRef, ArtworkType, MetadataType, UnifiedVideoRow};
use tracing::{debug, instrument, warn};

use crate::aggregates::{AggregateKind, compose_aggregate};
use crate::artwork::{ArtworkMap, ArtworkResolver, LanguagePriority};
use crate::compose::{ComposedQuery, PageLimits, QueryComposer};
use crate::database::ports::MetadataStore;
use crate::error::{QueryError, QueryPhase, Result};
use crate::grouping::ids_by_type;
use crate::mapper::{ColumnKind, FlatRow, VideoRowMapper};
use crate::query::{ArtworkRequest, FilterCriteria, NewestSource};
use crate::sql::CompiledQuery;

/// Engine-wide defaults applied to every request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSettings {
    /// Newest source used when sorting by newest without a newest facet.
    pub default_newest_source: NewestSource,
    pub page_limits: PageLimits,
    /// Rendition profile for requests that name none.
    pub artwork_profile: Option<String>,
    pub language: LanguagePriority,
}

/// One listed row with its artwork in resolution order.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoItem {
    pub row: UnifiedVideoRow,
    pub artwork: Vec<ArtworkRef>,
}

impl VideoItem {
    pub fn preferred_artwork(
        &self,
        artwork_type: ArtworkType,
        priority: &LanguagePriority,
    ) -> Option<&ArtworkRef> {
        priority.select_for(&self.artwork, artwork_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoPage {
    pub items: Vec<VideoItem>,
    /// Present only when the request asked for a total.
    pub total: Option<i64>,
}

impl VideoPage {
    pub fn rows(&self) -> impl Iterator<Item = &UnifiedVideoRow> {
        self.items.iter().map(|item| &item.row)
    }
}

#[derive(Debug, Clone)]
pub struct VideoQueryService<S> {
    store: S,
    settings: EngineSettings,
    artwork: ArtworkResolver,
}

impl<S: MetadataStore> VideoQueryService<S> {
    pub fn new(store: S, settings: EngineSettings) -> Self {
        let artwork = ArtworkResolver::new()
            .with_default_profile(settings.artwork_profile.clone());
        Self {
            store,
            settings,
            artwork,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// The item's best artwork of `artwork_type` under the configured
    /// language priority.
    pub fn preferred_artwork<'a>(
        &self,
        item: &'a VideoItem,
        artwork_type: ArtworkType,
    ) -> Option<&'a ArtworkRef> {
        item.preferred_artwork(artwork_type, &self.settings.language)
    }

    fn composer<'a>(&self, criteria: &'a FilterCriteria) -> QueryComposer<'a> {
        QueryComposer::new(criteria)
            .with_newest_fallback(self.settings.default_newest_source)
            .with_limits(self.settings.page_limits)
    }

    /// One page of unified rows, with artwork when requested.
    #[instrument(
        name = "video_query.list",
        skip_all,
        fields(types = ?criteria.types, artwork = criteria.wants_artwork()),
        err
    )]
    pub async fn list(&self, criteria: &FilterCriteria) -> Result<VideoPage> {
        let Some(composed) = self.composer(criteria).compose()? else {
            debug!("no entity types requested");
            return Ok(VideoPage {
                items: Vec::new(),
                total: criteria.pagination.with_total.then_some(0),
            });
        };

        let mapper = VideoRowMapper::new(criteria.extras.iter().copied());
        let compiled = composed.render(self.store.dialect())?;
        debug!(
            sql = %compiled.sql,
            params = compiled.params.len(),
            "listing unified rows"
        );
        let flat = self
            .fetch(&compiled, &mapper.column_kinds(), QueryPhase::Rows)
            .await?;
        let rows = mapper.map_all(&flat)?;
        debug!(rows = rows.len(), "unified rows mapped");

        let total = if criteria.pagination.with_total {
            Some(self.count_composed(&composed).await?)
        } else {
            None
        };

        let mut artwork = match &criteria.artwork {
            Some(request) if criteria.wants_artwork() && !rows.is_empty() => {
                self.artwork
                    .resolve(&self.store, &ids_by_type(&rows), request)
                    .await?
            }
            _ => ArtworkMap::new(),
        };

        let items = rows
            .into_iter()
            .map(|row| VideoItem {
                artwork: artwork.remove(&row.key()).unwrap_or_default(),
                row,
            })
            .collect();
        Ok(VideoPage { items, total })
    }

    /// Number of rows the listing would return without paging.
    #[instrument(
        name = "video_query.count",
        skip_all,
        fields(types = ?criteria.types),
        err
    )]
    pub async fn count(&self, criteria: &FilterCriteria) -> Result<i64> {
        match self.composer(criteria).compose()? {
            Some(composed) => self.count_composed(&composed).await,
            None => Ok(0),
        }
    }

    async fn count_composed(&self, composed: &ComposedQuery) -> Result<i64> {
        let compiled = composed.render_count(self.store.dialect())?;
        debug!(
            sql = %compiled.sql,
            params = compiled.params.len(),
            "counting rows"
        );
        let rows = self
            .fetch(&compiled, &[ColumnKind::Integer], QueryPhase::Count)
            .await?;
        match rows.first() {
            Some(row) => Ok(row.opt_i64(0, "total")?.unwrap_or(0)),
            None => Ok(0),
        }
    }

    #[instrument(
        name = "video_query.distinct_letters",
        skip_all,
        fields(types = ?criteria.types),
        err
    )]
    pub async fn distinct_letters(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<String>> {
        let rows = self.aggregate(criteria, AggregateKind::Letters).await?;
        let mut letters = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(letter) = row.opt_text(0, "value")?
                && !letter.trim().is_empty()
            {
                letters.push(letter);
            }
        }
        Ok(letters)
    }

    #[instrument(
        name = "video_query.distinct_years",
        skip_all,
        fields(types = ?criteria.types),
        err
    )]
    pub async fn distinct_years(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<i32>> {
        let rows = self.aggregate(criteria, AggregateKind::Years).await?;
        integers(&rows)
    }

    #[instrument(
        name = "video_query.distinct_decades",
        skip_all,
        fields(types = ?criteria.types),
        err
    )]
    pub async fn distinct_decades(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<i32>> {
        let rows = self.aggregate(criteria, AggregateKind::Decades).await?;
        integers(&rows)
    }

    /// Artwork for owners resolved elsewhere, e.g. people or boxed sets.
    pub async fn resolve_artwork(
        &self,
        owners: &BTreeMap<MetadataType, Vec<i64>>,
        request: &ArtworkRequest,
    ) -> Result<ArtworkMap> {
        self.artwork.resolve(&self.store, owners, request).await
    }

    async fn aggregate(
        &self,
        criteria: &FilterCriteria,
        kind: AggregateKind,
    ) -> Result<Vec<FlatRow>> {
        let newest_source = self.settings.default_newest_source;
        let query = compose_aggregate(criteria, kind, newest_source)?;
        let Some(query) = query else {
            return Ok(Vec::new());
        };
        let compiled = query.render(self.store.dialect())?;
        debug!(
            aggregate = kind.as_str(),
            sql = %compiled.sql,
            params = compiled.params.len(),
            "aggregating"
        );
        self.fetch(&compiled, &[kind.column_kind()], QueryPhase::Aggregate)
            .await
    }

    async fn fetch(
        &self,
        compiled: &CompiledQuery,
        columns: &[ColumnKind],
        phase: QueryPhase,
    ) -> Result<Vec<FlatRow>> {
        self.store.fetch(compiled, columns).await.map_err(|err| {
            warn!(%phase, error = %err, "store query failed");
            QueryError::store(phase)(err)
        })
    }
}

fn integers(rows: &[FlatRow]) -> Result<Vec<i32>> {
    let mut values = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(value) = row.opt_i32(0, "value")? {
            values.push(value);
        }
    }
    Ok(values)
}
