use anyhow::{Context, anyhow, bail};
use marquee_core::query::NewestSource;
use marquee_core::{Dialect, EngineSettings, LanguagePriority, PageLimits};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub const CONFIG_PATH_ENV: &str = "MARQUEE_QUERY_CONFIG_PATH";
pub const CONFIG_JSON_ENV: &str = "MARQUEE_QUERY_CONFIG_JSON";
pub const DEFAULT_FILE_NAME: &str = "marquee-query.toml";

/// Source that produced the engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

/// Query engine settings. Every field is optional in the file; missing ones
/// keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct QueryEngineConfig {
    /// Recency source used for newest sorting and the newest extra column
    /// when a request carries no newest facet of its own.
    pub default_newest_source: NewestSource,
    /// Page size applied when a request names no limit.
    pub default_page_size: u32,
    /// Upper bound for any requested page size.
    pub max_page_size: u32,
    /// Generated rendition profile joined when a request names none. Without
    /// one, artwork references come back uncached.
    pub artwork_profile: Option<String>,
    pub preferred_language: Option<String>,
    pub alternate_language: Option<String>,
    /// Store the engine talks to; selects the adapter and placeholder
    /// syntax.
    pub dialect: Dialect,
    /// Pool size for [`Self::connect_store`].
    pub max_connections: u32,
}

impl Default for QueryEngineConfig {
    fn default() -> Self {
        let limits = PageLimits::default();
        Self {
            default_newest_source: NewestSource::default(),
            default_page_size: limits.default_size,
            max_page_size: limits.max_size,
            artwork_profile: None,
            preferred_language: None,
            alternate_language: None,
            dialect: Dialect::default(),
            max_connections: 5,
        }
    }
}

impl QueryEngineConfig {
    /// Load engine configuration.
    /// Evaluation order:
    /// 1) `$MARQUEE_QUERY_CONFIG_PATH` (TOML or JSON file),
    /// 2) `$MARQUEE_QUERY_CONFIG_JSON` (inline JSON),
    /// 3) `marquee-query.toml` in the working directory,
    /// 4) defaults if none of the above is present.
    pub fn load_from_env() -> anyhow::Result<(Self, ConfigSource)> {
        let cwd = env::current_dir()
            .context("failed to resolve the working directory")?;
        Self::load_with(|key| env::var(key).ok(), &cwd)
    }

    /// Same resolution as [`Self::load_from_env`], with an injectable
    /// variable lookup and search directory.
    pub fn load_with(
        lookup: impl Fn(&str) -> Option<String>,
        search_dir: &Path,
    ) -> anyhow::Result<(Self, ConfigSource)> {
        let (config, source) = Self::resolve(lookup, search_dir)?;
        config.validate().with_context(|| {
            format!("invalid query engine config from {source:?}")
        })?;
        Ok((config, source))
    }

    fn resolve(
        lookup: impl Fn(&str) -> Option<String>,
        search_dir: &Path,
    ) -> anyhow::Result<(Self, ConfigSource)> {
        if let Some(path_str) = lookup(CONFIG_PATH_ENV)
            && !path_str.trim().is_empty()
        {
            let path = PathBuf::from(path_str.trim());
            let config = Self::load_from_file(&path)?;
            return Ok((config, ConfigSource::EnvPath(path)));
        }

        if let Some(raw) = lookup(CONFIG_JSON_ENV)
            && !raw.trim().is_empty()
        {
            let parsed = Self::parse_json(&raw)
                .with_context(|| format!("failed to parse {CONFIG_JSON_ENV}"))?;
            return Ok((parsed, ConfigSource::EnvInline));
        }

        let candidate = search_dir.join(DEFAULT_FILE_NAME);
        if candidate.is_file() {
            let config = Self::load_from_file(&candidate)?;
            return Ok((config, ConfigSource::File(candidate)));
        }

        Ok((Self::default(), ConfigSource::Default))
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| {
            format!(
                "failed to read query engine config from {}",
                path.display()
            )
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&contents).with_context(|| {
                format!("invalid query engine config {}", path.display())
            }),
            Some("toml") | Some("tml") => {
                toml::from_str(&contents).map_err(|err| {
                    anyhow!(
                        "invalid query engine config {}: {}",
                        path.display(),
                        err
                    )
                })
            }
            _ => Self::parse_from_str(&contents, &path.display().to_string()),
        }
    }

    pub fn parse_from_str(
        contents: &str,
        origin: &str,
    ) -> anyhow::Result<Self> {
        // TOML first, then JSON.
        toml::from_str(contents).or_else(|toml_err| {
            serde_json::from_str(contents).map_err(|json_err| {
                anyhow!(
                    "failed to parse query engine config {}: \
                     toml error: {}; json error: {}",
                    origin,
                    toml_err,
                    json_err
                )
            })
        })
    }

    pub fn parse_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw)
            .map_err(|err| anyhow!("invalid query engine config json: {err}"))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_connections == 0 {
            bail!("max_connections must be at least 1");
        }
        if self.default_page_size == 0 {
            bail!("default_page_size must be at least 1");
        }
        if self.default_page_size > self.max_page_size {
            bail!(
                "default_page_size {} exceeds max_page_size {}",
                self.default_page_size,
                self.max_page_size
            );
        }
        Ok(())
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_size: self.default_page_size,
            max_size: self.max_page_size,
        }
    }

    pub fn language_priority(&self) -> LanguagePriority {
        let normalize = |code: &Option<String>| {
            code.as_deref()
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_owned)
        };
        LanguagePriority::new(
            normalize(&self.preferred_language),
            normalize(&self.alternate_language),
        )
    }

    pub fn into_settings(self) -> EngineSettings {
        EngineSettings {
            default_newest_source: self.default_newest_source,
            page_limits: self.page_limits(),
            language: self.language_priority(),
            artwork_profile: self
                .artwork_profile
                .filter(|profile| !profile.trim().is_empty()),
        }
    }
}
