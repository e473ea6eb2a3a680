use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};
use tracing::trace;

use crate::database::ports::MetadataStore;
use crate::mapper::{ColumnKind, ColumnValue, FlatRow};
use crate::sql::{CompiledQuery, Dialect, SqlValue};

#[derive(Clone, Debug)]
pub struct PostgresMetadataStore {
    pool: PgPool,
}

impl PostgresMetadataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[SqlValue],
) -> Query<'q, Postgres, PgArguments> {
    for value in params {
        query = match value {
            SqlValue::Int(value) => query.bind(*value),
            SqlValue::Text(value) => query.bind(value.clone()),
            SqlValue::Bool(value) => query.bind(*value),
            SqlValue::Timestamp(value) => query.bind(*value),
        };
    }
    query
}

/// Integer columns come back as INT8, INT4 or INT2 depending on the source
/// column; widen all of them.
fn decode_int(row: &PgRow, index: usize) -> Result<Option<i64>, sqlx::Error> {
    match row.try_get::<Option<i64>, _>(index) {
        Err(sqlx::Error::ColumnDecode { .. }) => {}
        other => return other,
    }
    match row.try_get::<Option<i32>, _>(index) {
        Err(sqlx::Error::ColumnDecode { .. }) => {}
        other => return other.map(|value| value.map(i64::from)),
    }
    row.try_get::<Option<i16>, _>(index)
        .map(|value| value.map(i64::from))
}

fn decode_timestamp(
    row: &PgRow,
    index: usize,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    match row.try_get::<Option<DateTime<Utc>>, _>(index) {
        Err(sqlx::Error::ColumnDecode { .. }) => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .map(|value| value.map(|naive| naive.and_utc())),
        other => other,
    }
}

fn decode_row(
    row: &PgRow,
    columns: &[ColumnKind],
) -> Result<FlatRow, sqlx::Error> {
    let mut values = Vec::with_capacity(columns.len());
    for (index, kind) in columns.iter().enumerate() {
        let value = match kind {
            ColumnKind::Id | ColumnKind::OptionalId | ColumnKind::Integer => {
                decode_int(row, index)?.map(ColumnValue::Int)
            }
            ColumnKind::Enum | ColumnKind::Text => row
                .try_get::<Option<String>, _>(index)?
                .map(ColumnValue::Text),
            ColumnKind::Date => row
                .try_get::<Option<NaiveDate>, _>(index)?
                .map(ColumnValue::Date),
            ColumnKind::Boolean => row
                .try_get::<Option<bool>, _>(index)?
                .map(ColumnValue::Bool),
            ColumnKind::Timestamp => {
                decode_timestamp(row, index)?.map(ColumnValue::Timestamp)
            }
        };
        values.push(value.unwrap_or(ColumnValue::Null));
    }
    Ok(FlatRow(values))
}

#[async_trait]
impl MetadataStore for PostgresMetadataStore {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn fetch(
        &self,
        query: &CompiledQuery,
        columns: &[ColumnKind],
    ) -> Result<Vec<FlatRow>, sqlx::Error> {
        trace!(sql = %query.sql, params = query.params.len(), "postgres fetch");
        let rows = bind_all(sqlx::query(&query.sql), &query.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| decode_row(row, columns)).collect()
    }
}
