pub mod config;
pub mod paths;

pub use config::{Config, ConfigError, MAX_AGE_HOURS_LIMIT, PlaylistConfig, CatalogConfig, CatalogStrategy, CacheConfig, OutputConfig, GeneratorConfig, default_generator_args};
pub use paths::{PathManager, container_base_path};
