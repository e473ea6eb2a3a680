pub mod infrastructure;
pub mod ports;

pub use infrastructure::{PostgresMetadataStore, SqliteMetadataStore};
pub use ports::MetadataStore;
