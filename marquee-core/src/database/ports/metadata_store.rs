use std::sync::Arc;

use async_trait::async_trait;

use crate::mapper::{ColumnKind, FlatRow};
use crate::sql::{CompiledQuery, Dialect};

/// Read-only port onto the relational metadata store.
///
/// Adapters execute a rendered query with its positional parameters and decode
/// each column according to the requested kinds. They perform no retries;
/// timeouts are whatever the underlying pool enforces.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Placeholder dialect queries for this store must be rendered in.
    fn dialect(&self) -> Dialect;

    async fn fetch(
        &self,
        query: &CompiledQuery,
        columns: &[ColumnKind],
    ) -> Result<Vec<FlatRow>, sqlx::Error>;
}

#[async_trait]
impl<T: MetadataStore + ?Sized> MetadataStore for Arc<T> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    async fn fetch(
        &self,
        query: &CompiledQuery,
        columns: &[ColumnKind],
    ) -> Result<Vec<FlatRow>, sqlx::Error> {
        (**self).fetch(query, columns).await
    }
}
