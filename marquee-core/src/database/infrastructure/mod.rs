pub mod postgres;
pub mod sqlite;

pub use postgres::PostgresMetadataStore;
pub use sqlite::SqliteMetadataStore;
