#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use marquee_core::{
    ColumnKind, CompiledQuery, Dialect, EngineSettings, FlatRow, MetadataStore,
    SqliteMetadataStore, VideoPage, VideoQueryService,
};
use marquee_model::MetadataType;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

pub const SCHEMA: &str = include_str!("../fixtures/schema.sql");

/// In-memory store seeded with the fixture schema.
///
/// One connection only: every SQLite in-memory connection is its own
/// database.
pub struct Fixture {
    pub pool: SqlitePool,
}

impl Fixture {
    pub async fn new() -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory sqlite");
        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .expect("Failed to apply fixture schema");
        Self { pool }
    }

    pub async fn exec(&self, sql: &str) {
        sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .unwrap_or_else(|err| {
                panic!("fixture statement failed: {err}\n{sql}")
            });
    }

    pub fn store(&self) -> SqliteMetadataStore {
        SqliteMetadataStore::new(self.pool.clone())
    }

    pub fn service(&self) -> VideoQueryService<SqliteMetadataStore> {
        self.service_with(EngineSettings::default())
    }

    pub fn service_with(
        &self,
        settings: EngineSettings,
    ) -> VideoQueryService<SqliteMetadataStore> {
        VideoQueryService::new(self.store(), settings)
    }

    pub async fn movie(&self, id: i64, title: &str, year: i32) {
        sqlx::query(
            "INSERT INTO videodata (id, episode, title, title_sort, \
             publication_year, release_date, create_timestamp) \
             VALUES (?1, -1, ?2, ?2, ?3, ?4, '2020-01-01 00:00:00')",
        )
        .bind(id)
        .bind(title)
        .bind(year)
        .bind(format!("{year}-06-01"))
        .execute(&self.pool)
        .await
        .expect("Failed to insert movie");
    }

    pub async fn series(&self, id: i64, title: &str, start_year: i32) {
        sqlx::query(
            "INSERT INTO series (id, title, start_year, create_timestamp) \
             VALUES (?1, ?2, ?3, '2020-01-01 00:00:00')",
        )
        .bind(id)
        .bind(title)
        .bind(start_year)
        .execute(&self.pool)
        .await
        .expect("Failed to insert series");
    }

    pub async fn season(
        &self,
        id: i64,
        series_id: i64,
        number: i32,
        year: i32,
    ) {
        sqlx::query(
            "INSERT INTO season (id, series_id, season, title, \
             publication_year, create_timestamp) \
             VALUES (?1, ?2, ?3, ?4, ?5, '2020-01-01 00:00:00')",
        )
        .bind(id)
        .bind(series_id)
        .bind(number)
        .bind(format!("Season {number}"))
        .bind(year)
        .execute(&self.pool)
        .await
        .expect("Failed to insert season");
    }

    pub async fn episode(
        &self,
        id: i64,
        season_id: i64,
        number: i32,
        title: &str,
        watched: Option<bool>,
    ) {
        sqlx::query(
            "INSERT INTO videodata (id, season_id, episode, title, \
             publication_year, watched, create_timestamp) \
             VALUES (?1, ?2, ?3, ?4, 2015, ?5, '2020-01-01 00:00:00')",
        )
        .bind(id)
        .bind(season_id)
        .bind(number)
        .bind(title)
        .bind(watched)
        .execute(&self.pool)
        .await
        .expect("Failed to insert episode");
    }

    pub async fn genre(&self, id: i64, name: &str) {
        sqlx::query("INSERT INTO genre (id, name) VALUES (?1, ?2)")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await
            .expect("Failed to insert genre");
    }

    pub async fn tag_video_genre(&self, videodata_id: i64, genre_id: i64) {
        sqlx::query(
            "INSERT INTO videodata_genres (videodata_id, genre_id) \
             VALUES (?1, ?2)",
        )
        .bind(videodata_id)
        .bind(genre_id)
        .execute(&self.pool)
        .await
        .expect("Failed to tag genre");
    }

    pub async fn tag_series_genre(&self, series_id: i64, genre_id: i64) {
        sqlx::query(
            "INSERT INTO series_genres (series_id, genre_id) VALUES (?1, ?2)",
        )
        .bind(series_id)
        .bind(genre_id)
        .execute(&self.pool)
        .await
        .expect("Failed to tag genre");
    }

    pub async fn video_rating(
        &self,
        videodata_id: i64,
        source: &str,
        rating: i32,
    ) {
        sqlx::query(
            "INSERT INTO videodata_ratings (videodata_id, sourcedb, rating) \
             VALUES (?1, ?2, ?3)",
        )
        .bind(videodata_id)
        .bind(source)
        .bind(rating)
        .execute(&self.pool)
        .await
        .expect("Failed to insert rating");
    }

    /// One video media file with one stage file observed at `file_date`.
    pub async fn video_file(
        &self,
        file_id: i64,
        videodata_id: i64,
        file_date: &str,
        extra: bool,
        status: &str,
    ) {
        sqlx::query(
            "INSERT INTO mediafile (id, extra, video_source, width) \
             VALUES (?1, ?2, 'bluray', 1920)",
        )
        .bind(file_id)
        .bind(extra)
        .execute(&self.pool)
        .await
        .expect("Failed to insert mediafile");
        sqlx::query(
            "INSERT INTO mediafile_videodata (mediafile_id, videodata_id) \
             VALUES (?1, ?2)",
        )
        .bind(file_id)
        .bind(videodata_id)
        .execute(&self.pool)
        .await
        .expect("Failed to link mediafile");
        sqlx::query(
            "INSERT INTO stage_file (id, mediafile_id, status, file_date) \
             VALUES (?1, ?1, ?2, ?3)",
        )
        .bind(file_id)
        .bind(status)
        .bind(file_date)
        .execute(&self.pool)
        .await
        .expect("Failed to insert stage file");
    }
}

/// `(type, id)` of every row in page order.
pub fn keys(page: &VideoPage) -> Vec<(MetadataType, i64)> {
    page.rows().map(|row| row.key()).collect()
}

pub fn ids(page: &VideoPage) -> Vec<i64> {
    page.rows().map(|row| row.id).collect()
}

/// Store wrapper that records every SQL statement it executes.
#[derive(Clone)]
pub struct RecordingStore<S> {
    inner: S,
    pub statements: Arc<Mutex<Vec<String>>>,
}

impl<S> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            statements: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().expect("poisoned").clone()
    }
}

#[async_trait]
impl<S: MetadataStore> MetadataStore for RecordingStore<S> {
    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    async fn fetch(
        &self,
        query: &CompiledQuery,
        columns: &[ColumnKind],
    ) -> Result<Vec<FlatRow>, sqlx::Error> {
        self.statements
            .lock()
            .expect("poisoned")
            .push(query.sql.clone());
        self.inner.fetch(query, columns).await
    }
}
