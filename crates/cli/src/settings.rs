//! Layered application configuration
//!
//! A TOML file provides the station list and tuning; `GATHERER_*`
//! environment variables override individual keys.

use domain::StationConfig;
use gatherer::GathererConfig;
use serde::{Deserialize, Serialize};
use storage::DatabaseConfig;

/// Full application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Polling cycle settings
    #[serde(default)]
    pub gatherer: GathererConfig,

    /// SQLite settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Stations to poll, one `[[stations]]` table each
    #[serde(default)]
    pub stations: Vec<StationConfig>,
}

impl AppConfig {
    /// Load configuration from an optional file plus environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be parsed, or an
    /// environment override carries an invalid value.
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            // e.g. GATHERER_DATABASE_PATH
            .add_source(
                config::Environment::with_prefix("GATHERER")
                    .separator("_")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Provider;
    use std::io::Write;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load("/nonexistent/gatherer").unwrap();
        assert_eq!(config.gatherer.max_workers, 4);
        assert_eq!(config.database.path, "weather_gatherer.db");
        assert!(config.stations.is_empty());
    }

    #[test]
    fn toml_file_provides_stations_and_tuning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gatherer.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"
[gatherer]
max_workers = 2
request_timeout_secs = 5

[database]
path = ":memory:"

[[stations]]
id = "7f2c1a90-58f2-4b52-9a2e-0f0d77a31f11"
name = "Harbour mast"
provider = "holfuy"
station_key = "101"
api_secret = "secret"
timezone = "Europe/Madrid"
pressure_offset = -1.5
"#
        )
        .unwrap();

        let config = AppConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.gatherer.max_workers, 2);
        assert_eq!(config.gatherer.request_timeout_secs, 5);
        assert_eq!(config.database.path, ":memory:");
        assert_eq!(config.stations.len(), 1);

        let station = &config.stations[0];
        assert_eq!(station.provider, Provider::Holfuy);
        assert_eq!(station.timezone, chrono_tz::Europe::Madrid);
        assert_eq!(station.pressure_offset, Some(-1.5));
    }

    #[test]
    fn unknown_provider_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gatherer.toml");
        std::fs::write(
            &path,
            r#"
[[stations]]
id = "7f2c1a90-58f2-4b52-9a2e-0f0d77a31f11"
provider = "davis"
"#,
        )
        .unwrap();

        assert!(AppConfig::load(path.to_str().unwrap()).is_err());
    }
}
