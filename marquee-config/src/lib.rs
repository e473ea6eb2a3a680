//! Configuration for the Marquee query engine.
//!
//! [`QueryEngineConfig`] is read from a TOML or JSON file (or inline JSON in
//! the environment) and turned into the
//! [`EngineSettings`](marquee_core::EngineSettings) the query service runs
//! with. [`store`] opens the metadata store adapter for the configured
//! dialect, and [`telemetry`] installs the tracing subscriber.

pub mod engine;
pub mod store;
pub mod telemetry;

pub use engine::{
    CONFIG_JSON_ENV, CONFIG_PATH_ENV, ConfigSource, DEFAULT_FILE_NAME,
    QueryEngineConfig,
};
pub use store::SharedStore;
pub use telemetry::init_tracing;
