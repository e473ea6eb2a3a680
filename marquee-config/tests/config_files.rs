use std::fs;

use marquee_config::{QueryEngineConfig, telemetry};
use marquee_core::Dialect;
use marquee_core::query::NewestSource;
use tempfile::TempDir;

const SAMPLE: &str = r#"
default_newest_source = "creation"
default_page_size = 24
max_page_size = 96
artwork_profile = "w342"
preferred_language = "fr"
alternate_language = "en"
dialect = "sqlite"
max_connections = 2
"#;

#[test]
fn toml_file_round_trips_into_engine_settings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");
    fs::write(&path, SAMPLE).unwrap();

    let config = QueryEngineConfig::load_from_file(&path).unwrap();
    assert_eq!(config.dialect, Dialect::Sqlite);
    assert_eq!(config.max_connections, 2);

    let settings = config.into_settings();
    assert_eq!(settings.default_newest_source, NewestSource::Creation);
    assert_eq!(settings.page_limits.clamp(None), 24);
    assert_eq!(settings.page_limits.clamp(Some(500)), 96);
    assert_eq!(settings.artwork_profile.as_deref(), Some("w342"));
    assert_eq!(settings.language.preferred.as_deref(), Some("fr"));
    assert_eq!(settings.language.alternate.as_deref(), Some("en"));
}

#[test]
fn unknown_extension_is_sniffed() {
    let dir = TempDir::new().unwrap();
    let toml_path = dir.path().join("engine.conf");
    fs::write(&toml_path, SAMPLE).unwrap();
    let json_path = dir.path().join("engine.cfg");
    fs::write(&json_path, r#"{"default_page_size": 10}"#).unwrap();

    assert_eq!(
        QueryEngineConfig::load_from_file(&toml_path).unwrap().max_page_size,
        96
    );
    assert_eq!(
        QueryEngineConfig::load_from_file(&json_path)
            .unwrap()
            .default_page_size,
        10
    );
}

#[test]
fn json_extension_is_strict() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.json");
    fs::write(&path, SAMPLE).unwrap();

    let err = QueryEngineConfig::load_from_file(&path).unwrap_err();
    assert!(format!("{err:#}").contains("invalid query engine config"));
}

#[test]
fn missing_file_names_the_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let err = QueryEngineConfig::load_from_file(&path).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn unknown_dialect_is_rejected() {
    assert!(QueryEngineConfig::parse_json(r#"{"dialect": "mysql"}"#).is_err());
}

#[test]
fn fallback_directive_parses() {
    let filter = telemetry::env_filter(telemetry::DEFAULT_DIRECTIVE);
    assert!(!filter.to_string().is_empty());
}
