//! Tracing subscriber setup for binaries embedding the engine.

use tracing_subscriber::{
    EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Directive used when `RUST_LOG` is unset. Composed SQL is logged at
/// `debug` under `marquee_core`.
pub const DEFAULT_DIRECTIVE: &str = "info,marquee_core=info";

/// Filter from `RUST_LOG`, falling back to `default_directive`.
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive.into())
}

/// Installs the global subscriber: env filter plus the fmt layer.
///
/// Returns an error when a global subscriber is already set.
pub fn init_tracing(default_directive: &str) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(default_directive))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}
