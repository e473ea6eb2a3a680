//! SQLite adapter.
//!
//! SQLite keeps dates and timestamps as text and booleans as integers, and
//! drops declared column types across unions. Values are therefore read
//! without type checks and converted here.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool};
use tracing::trace;

use crate::database::ports::MetadataStore;
use crate::mapper::{ColumnKind, ColumnValue, FlatRow};
use crate::sql::{CompiledQuery, Dialect, SqlValue};

/// Text layout timestamp parameters are bound in. It matches the output of
/// SQLite's `datetime()`, which recency comparisons apply to both sides, so
/// stored values may use any layout `datetime()` understands.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone, Debug)]
pub struct SqliteMetadataStore {
    pool: SqlitePool,
}

impl SqliteMetadataStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in params {
        query = match value {
            SqlValue::Int(value) => query.bind(*value),
            SqlValue::Text(value) => query.bind(value.clone()),
            SqlValue::Bool(value) => query.bind(*value),
            SqlValue::Timestamp(value) => {
                query.bind(value.format(TIMESTAMP_FORMAT).to_string())
            }
        };
    }
    query
}

fn decode_error(index: usize, message: String) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: index.to_string(),
        source: message.into(),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

fn decode_row(
    row: &SqliteRow,
    columns: &[ColumnKind],
) -> Result<FlatRow, sqlx::Error> {
    let mut values = Vec::with_capacity(columns.len());
    for (index, kind) in columns.iter().enumerate() {
        let value = match kind {
            ColumnKind::Id | ColumnKind::OptionalId | ColumnKind::Integer => row
                .try_get_unchecked::<Option<i64>, _>(index)?
                .map(ColumnValue::Int),
            ColumnKind::Boolean => row
                .try_get_unchecked::<Option<i64>, _>(index)?
                .map(|flag| ColumnValue::Bool(flag != 0)),
            ColumnKind::Enum | ColumnKind::Text => row
                .try_get_unchecked::<Option<String>, _>(index)?
                .map(ColumnValue::Text),
            ColumnKind::Date => {
                match row.try_get_unchecked::<Option<String>, _>(index)? {
                    None => None,
                    Some(raw) => Some(ColumnValue::Date(
                        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                            .map_err(|err| {
                                let detail = format!("date {raw:?}: {err}");
                                decode_error(index, detail)
                            })?,
                    )),
                }
            }
            ColumnKind::Timestamp => {
                match row.try_get_unchecked::<Option<String>, _>(index)? {
                    None => None,
                    Some(raw) => Some(ColumnValue::Timestamp(
                        parse_timestamp(raw.trim()).ok_or_else(|| {
                            decode_error(index, format!("timestamp {raw:?}"))
                        })?,
                    )),
                }
            }
        };
        values.push(value.unwrap_or(ColumnValue::Null));
    }
    Ok(FlatRow(values))
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn fetch(
        &self,
        query: &CompiledQuery,
        columns: &[ColumnKind],
    ) -> Result<Vec<FlatRow>, sqlx::Error> {
        trace!(sql = %query.sql, params = query.params.len(), "sqlite fetch");
        let rows = bind_all(sqlx::query(&query.sql), &query.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| decode_row(row, columns)).collect()
    }
}
