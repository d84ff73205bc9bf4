//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the tide-config.toml file.
//! It provides a centralized way to configure the forecast location, the boatable
//! threshold and daylight hours, and where results and cached forecasts are written.

use crate::scanner::{Daylight, ScanParams, DEFAULT_THRESHOLD, DEFAULT_TICK_MINUTES};
use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "tide-config.toml";

/// Errors in configuration values that parse as TOML but make no sense.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("invalid time of day {0:?}, expected HH:MM")]
    InvalidTime(String),

    #[error("daylight window {start} - {end} is empty")]
    EmptyDaylight { start: NaiveTime, end: NaiveTime },

    #[error("tick must be a positive number of minutes, got {0}")]
    InvalidTick(i64),
}

/// Application configuration loaded from tide-config.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Forecast location
    pub location: LocationConfig,
    /// Window scanning parameters
    pub scan: ScanConfig,
    /// Output and cache files
    pub output: OutputConfig,
}

/// WillyWeather location configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocationConfig {
    /// WillyWeather location ID (e.g., 33211 for Victoria Point Boat Ramp)
    pub id: u32,
    /// Human-readable location name for reference
    pub name: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

/// Threshold, daylight hours and forecast length
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Minimum boatable height in meters
    pub threshold: f64,
    /// Start of daylight, "HH:MM"
    pub daylight_start: String,
    /// End of daylight, "HH:MM" (inclusive)
    pub daylight_end: String,
    /// Sampling resolution
    pub tick_minutes: i64,
    /// Number of forecast days to request
    pub days: u32,
}

/// Output locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// CSV file receiving one row per date
    pub csv_path: PathBuf,
    /// Forecast cache file
    pub cache_path: PathBuf,
    /// Cache TTL in minutes
    pub cache_ttl_minutes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            location: LocationConfig {
                id: 33211,
                name: "Victoria Point Boat Ramp".to_string(),
                api_key_env: "WILLY_WEATHER_API_KEY".to_string(),
            },
            scan: ScanConfig {
                threshold: DEFAULT_THRESHOLD,
                daylight_start: "06:00".to_string(),
                daylight_end: "17:30".to_string(),
                tick_minutes: DEFAULT_TICK_MINUTES,
                days: 180,
            },
            output: OutputConfig {
                csv_path: PathBuf::from("tide_windows.csv"),
                cache_path: PathBuf::from("/tmp/tide_windows_cache.json"),
                cache_ttl_minutes: 30,
            },
        }
    }
}

impl Config {
    /// Load configuration from tide-config.toml file
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(location = %config.location.name, "loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable config file, using defaults");
                Self::default()
            }
        }
    }

    /// Save current configuration to the given path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}

impl ScanConfig {
    /// Validated scanner parameters.
    pub fn scan_params(&self) -> Result<ScanParams, ConfigError> {
        let start = parse_time(&self.daylight_start)?;
        let end = parse_time(&self.daylight_end)?;
        if start >= end {
            return Err(ConfigError::EmptyDaylight { start, end });
        }
        if self.tick_minutes <= 0 {
            return Err(ConfigError::InvalidTick(self.tick_minutes));
        }
        let tick = Duration::try_minutes(self.tick_minutes)
            .ok_or(ConfigError::InvalidTick(self.tick_minutes))?;

        Ok(ScanParams {
            threshold: self.threshold,
            daylight: Daylight { start, end },
            tick,
        })
    }
}

fn parse_time(value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ConfigError::InvalidTime(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.location.id, 33211);
        assert_eq!(config.location.name, "Victoria Point Boat Ramp");
        assert_eq!(config.scan.threshold, 1.6);
        assert_eq!(config.scan.days, 180);
        assert_eq!(config.output.cache_ttl_minutes, 30);
    }

    #[test]
    fn test_default_scan_params() {
        let params = Config::default().scan.scan_params().unwrap();
        assert_eq!(params, ScanParams::default());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.location.id, parsed.location.id);
        assert_eq!(config.scan.daylight_end, parsed.scan.daylight_end);
        assert_eq!(config.output.csv_path, parsed.output.csv_path);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config.location.id, 33211);
    }

    #[test]
    fn test_load_invalid_file_falls_back() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "this is = not [valid").unwrap();
        let config = Config::load_from_path(file.path());
        assert_eq!(config.location.id, 33211);
    }

    #[test]
    fn test_save_and_load() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.scan.threshold = 1.2;
        config.location.name = "Cleveland Point".to_string();

        config.save(file.path()).unwrap();
        let loaded = Config::load_from_path(file.path());
        assert_eq!(loaded.scan.threshold, 1.2);
        assert_eq!(loaded.location.name, "Cleveland Point");
    }

    #[test]
    fn test_rejects_bad_daylight() {
        let mut scan = Config::default().scan;
        scan.daylight_start = "6am".to_string();
        assert_eq!(
            scan.scan_params(),
            Err(ConfigError::InvalidTime("6am".to_string()))
        );

        scan.daylight_start = "18:00".to_string();
        assert!(matches!(
            scan.scan_params(),
            Err(ConfigError::EmptyDaylight { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_tick() {
        let mut scan = Config::default().scan;
        scan.tick_minutes = 0;
        assert_eq!(scan.scan_params(), Err(ConfigError::InvalidTick(0)));

        scan.tick_minutes = -15;
        assert_eq!(scan.scan_params(), Err(ConfigError::InvalidTick(-15)));

        // Too large for a chrono duration
        scan.tick_minutes = i64::MAX / 1000;
        assert_eq!(
            scan.scan_params(),
            Err(ConfigError::InvalidTick(i64::MAX / 1000))
        );
    }

    #[test]
    fn test_load_directory_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        // Reading a directory fails with something other than NotFound
        let config = Config::load_from_path(dir.path());
        assert_eq!(config.location.id, 33211);
    }
}
