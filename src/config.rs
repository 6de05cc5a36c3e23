//! Layered settings: built-in defaults, then an optional TOML file, then
//! `MARKETX_*` environment variables (`__` separates nesting, e.g.
//! `MARKETX_DATABASE__URL`).

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CacheSettings {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LogSettings {
    pub filter: String,
    pub metrics_port: u16,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub log: LogSettings,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::builder(path)?
            .add_source(Environment::with_prefix("MARKETX").separator("__"))
            .build()?
            .try_deserialize()
    }

    fn builder(path: &Path) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("database.url", "postgres://localhost/marketx")?
            .set_default("database.max_connections", 5)?
            .set_default("cache.path", "data/cache")?
            .set_default("log.filter", "info")?
            .set_default("log.metrics_port", 9000)?
            .add_source(File::from(path).required(false)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::builder(Path::new("does-not-exist.toml"))
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize::<Settings>()
            .unwrap();
        assert_eq!(settings.database.max_connections, 5);
        assert_eq!(settings.cache.path, "data/cache");
        assert_eq!(settings.log.filter, "info");
        assert_eq!(settings.log.metrics_port, 9000);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("marketx-config-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[database]\nurl = \"postgres://db/venue\"\n\n[log]\nfilter = \"debug\"").unwrap();

        let settings = Settings::builder(&path)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize::<Settings>()
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.database.url, "postgres://db/venue");
        assert_eq!(settings.database.max_connections, 5);
        assert_eq!(settings.log.filter, "debug");
    }
}
