//! Store construction for the configured dialect.

use std::sync::Arc;

use anyhow::{Context, bail};
use marquee_core::{
    Dialect, MetadataStore, PostgresMetadataStore, SqliteMetadataStore,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;

use crate::engine::QueryEngineConfig;

/// Whichever adapter the config selected, behind the store port.
pub type SharedStore = Arc<dyn MetadataStore>;

/// Dialect named by a connection URL's scheme.
pub fn dialect_for_url(database_url: &str) -> Option<Dialect> {
    let (scheme, _) = database_url.split_once(':')?;
    match scheme.to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" => Some(Dialect::Postgres),
        "sqlite" => Some(Dialect::Sqlite),
        _ => None,
    }
}

impl QueryEngineConfig {
    /// Opens a pool for `database_url` and wraps it in the adapter for
    /// [`Self::dialect`]. A URL for the other store is rejected before
    /// connecting.
    pub async fn connect_store(
        &self,
        database_url: &str,
    ) -> anyhow::Result<SharedStore> {
        match dialect_for_url(database_url) {
            None => bail!("database url has an unsupported scheme"),
            Some(dialect) if dialect != self.dialect => bail!(
                "database url is for {dialect:?} \
                 but the configured dialect is {:?}",
                self.dialect
            ),
            Some(_) => {}
        }

        let store: SharedStore = match self.dialect {
            Dialect::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(self.max_connections)
                    .connect(database_url)
                    .await
                    .context("failed to connect to postgres")?;
                Arc::new(PostgresMetadataStore::new(pool))
            }
            Dialect::Sqlite => {
                let pool = SqlitePoolOptions::new()
                    .max_connections(self.max_connections)
                    .connect(database_url)
                    .await
                    .context("failed to open sqlite database")?;
                Arc::new(SqliteMetadataStore::new(pool))
            }
        };
        info!(
            dialect = ?self.dialect,
            max_connections = self.max_connections,
            "metadata store connected"
        );
        Ok(store)
    }
}
