use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub playlist: PlaylistConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistConfig {
    /// Local path or http(s) URL of the M3U playlist
    #[serde(default = "default_playlist_source")]
    pub source: String,
    #[serde(default = "default_fetch_timeout_seconds")]
    pub fetch_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Directory holding `<provider>/<name>.channels.xml` documents
    #[serde(default = "default_catalog_root")]
    pub root: PathBuf,
    #[serde(default)]
    pub strategy: CatalogStrategy,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CatalogStrategy {
    /// Parse every document once and look identifiers up in memory
    #[default]
    Indexed,
    /// Re-scan the documents for every lookup
    Scan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_match_cache_file")]
    pub match_cache_file: PathBuf,
    #[serde(default = "default_match_max_age_hours")]
    pub match_max_age_hours: u64,
    #[serde(default = "default_guide_max_age_hours")]
    pub guide_max_age_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_playlist_file")]
    pub playlist_file: PathBuf,
    #[serde(default = "default_channels_file")]
    pub channels_file: PathBuf,
    #[serde(default = "default_guide_file")]
    pub guide_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_generator_program")]
    pub program: String,
    /// Supports `{channels}`, `{output}`, `{max_connections}` and `{days}` placeholders
    #[serde(default = "default_generator_args")]
    pub args: Vec<String>,
    #[serde(default = "default_generator_working_dir")]
    pub working_dir: PathBuf,
    /// Artifact produced by the generator, relative to `working_dir`
    #[serde(default = "default_generator_output_file")]
    pub output_file: PathBuf,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default = "default_generator_env")]
    pub env: BTreeMap<String, String>,
}

fn default_playlist_source() -> String {
    "https://iptv-org.github.io/iptv/countries/us.m3u".to_string()
}

fn default_fetch_timeout_seconds() -> u64 {
    60
}

fn default_catalog_root() -> PathBuf {
    PathBuf::from("./epg-workspace/epg/sites")
}

fn default_match_cache_file() -> PathBuf {
    PathBuf::from("./epg-workspace/channel-cache.json")
}

fn default_match_max_age_hours() -> u64 {
    24
}

fn default_guide_max_age_hours() -> u64 {
    12
}

fn default_playlist_file() -> PathBuf {
    PathBuf::from("./playlist-filtered.m3u")
}

fn default_channels_file() -> PathBuf {
    PathBuf::from("./epg-workspace/epg/channels.xml")
}

fn default_guide_file() -> PathBuf {
    PathBuf::from("./guide.xml")
}

fn default_generator_program() -> String {
    "npm".to_string()
}

pub fn default_generator_args() -> Vec<String> {
    [
        "run",
        "grab",
        "--",
        "--channels={channels}",
        "--output={output}",
        "--maxConnections={max_connections}",
        "--days={days}",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_generator_working_dir() -> PathBuf {
    PathBuf::from("./epg-workspace/epg")
}

fn default_generator_output_file() -> PathBuf {
    PathBuf::from("guide.xml")
}

fn default_max_connections() -> u32 {
    5
}

fn default_days() -> u32 {
    1
}

fn default_generator_env() -> BTreeMap<String, String> {
    // Large channel lists exhaust node's default heap
    let mut env = BTreeMap::new();
    env.insert("NODE_OPTIONS".to_string(), "--max-old-space-size=8192".to_string());
    env
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            source: default_playlist_source(),
            fetch_timeout_seconds: default_fetch_timeout_seconds(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            root: default_catalog_root(),
            strategy: CatalogStrategy::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            match_cache_file: default_match_cache_file(),
            match_max_age_hours: default_match_max_age_hours(),
            guide_max_age_hours: default_guide_max_age_hours(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            playlist_file: default_playlist_file(),
            channels_file: default_channels_file(),
            guide_file: default_guide_file(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            program: default_generator_program(),
            args: default_generator_args(),
            working_dir: default_generator_working_dir(),
            output_file: default_generator_output_file(),
            max_connections: default_max_connections(),
            days: default_days(),
            env: default_generator_env(),
        }
    }
}

/// Upper bound for either max-age setting, one year.
pub const MAX_AGE_HOURS_LIMIT: u64 = 24 * 365;

impl CacheConfig {
    pub fn match_max_age(&self) -> chrono::Duration {
        hours_capped(self.match_max_age_hours)
    }

    pub fn guide_max_age(&self) -> chrono::Duration {
        hours_capped(self.guide_max_age_hours)
    }
}

fn hours_capped(hours: u64) -> chrono::Duration {
    chrono::Duration::hours(hours.min(MAX_AGE_HOURS_LIMIT) as i64)
}

impl GeneratorConfig {
    /// Path of the generated guide before it is relocated.
    pub fn artifact_path(&self) -> PathBuf {
        self.working_dir.join(&self.output_file)
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    /// Load the file when it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.playlist.source.trim().is_empty() {
            return Err(ConfigError::Invalid("playlist.source cannot be empty".to_string()));
        }
        if self.playlist.fetch_timeout_seconds == 0 {
            return Err(ConfigError::Invalid("playlist.fetch_timeout_seconds must be positive".to_string()));
        }
        if self.cache.match_max_age_hours == 0 {
            return Err(ConfigError::Invalid("cache.match_max_age_hours must be positive".to_string()));
        }
        if self.cache.guide_max_age_hours == 0 {
            return Err(ConfigError::Invalid("cache.guide_max_age_hours must be positive".to_string()));
        }
        for (name, hours) in [
            ("match_max_age_hours", self.cache.match_max_age_hours),
            ("guide_max_age_hours", self.cache.guide_max_age_hours),
        ] {
            if hours > MAX_AGE_HOURS_LIMIT {
                return Err(ConfigError::Invalid(format!(
                    "cache.{} must be at most {}",
                    name, MAX_AGE_HOURS_LIMIT
                )));
            }
        }
        if self.generator.program.trim().is_empty() {
            return Err(ConfigError::Invalid("generator.program cannot be empty".to_string()));
        }
        if self.generator.max_connections == 0 {
            return Err(ConfigError::Invalid("generator.max_connections must be at least 1".to_string()));
        }
        if self.generator.days == 0 {
            return Err(ConfigError::Invalid("generator.days must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.playlist.source = "/srv/iptv/us.m3u".to_string();
        config.catalog.strategy = CatalogStrategy::Scan;
        config.generator.max_connections = 10;

        config.save_to_file(file.path()).unwrap();

        let loaded = Config::load_from_file(file.path()).unwrap();
        assert_eq!(loaded.playlist.source, "/srv/iptv/us.m3u");
        assert_eq!(loaded.catalog.strategy, CatalogStrategy::Scan);
        assert_eq!(loaded.generator.max_connections, 10);
        assert_eq!(loaded.generator.env.get("NODE_OPTIONS").map(String::as_str), Some("--max-old-space-size=8192"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            "[cache]\nmatch_max_age_hours = 6\n\n[generator]\ndays = 2\n",
        )
        .unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.cache.match_max_age_hours, 6);
        assert_eq!(config.cache.guide_max_age_hours, 12);
        assert_eq!(config.generator.days, 2);
        assert_eq!(config.generator.max_connections, 5);
        assert_eq!(config.generator.args, default_generator_args());
        assert_eq!(config.catalog.strategy, CatalogStrategy::Indexed);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.cache.match_max_age_hours = 0;
        assert!(config.validate().is_err());

        config.cache.match_max_age_hours = 24;
        config.generator.days = 0;
        assert!(config.validate().is_err());

        config.generator.days = 1;
        config.playlist.source = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[cache\nmatch_max_age_hours = ").unwrap();

        let err = Config::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_max_age_durations() {
        let cache = CacheConfig::default();
        assert_eq!(cache.match_max_age(), chrono::Duration::hours(24));
        assert_eq!(cache.guide_max_age(), chrono::Duration::hours(12));
    }

    #[test]
    fn test_huge_max_age_is_rejected() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[cache]\nguide_max_age_hours = 9223372036854775807\n").unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert!(config.validate().is_err());
        assert_eq!(config.cache.guide_max_age(), chrono::Duration::hours(24 * 365));

        let mut config = Config::default();
        config.cache.match_max_age_hours = MAX_AGE_HOURS_LIMIT;
        assert!(config.validate().is_ok());
        config.cache.match_max_age_hours = MAX_AGE_HOURS_LIMIT + 1;
        assert!(config.validate().is_err());
    }
}
