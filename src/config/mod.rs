//! Configuration management for pinwheel
//!
//! Settings are loaded from a TOML file or from `PINWHEEL_*` environment
//! variables, then validated before the engine is built.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::CatalogConfig;
use crate::error::Error;
use crate::rotation::clustering::ClusteringConfig;
use crate::rotation::seasonal::SeasonalRules;
use crate::rotation::selector::{SelectionConfig, SelectionStrategy};
use crate::rotation::tracker::RotationPolicy;
use crate::storage::{DEFAULT_HISTORY_CAPACITY, DEFAULT_MAX_BYTES};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the catalog comes from
    pub catalog: CatalogConfig,

    /// Persisted state locations and limits
    pub storage: StorageConfig,

    /// Exclusion memory sizing
    pub rotation: RotationPolicy,

    /// Same-episode guard
    pub clustering: ClusteringConfig,

    /// Sampling strategy
    pub selection: SelectionConfig,

    /// Seasonal groups
    pub seasonal: SeasonalRules,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Persisted state configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Rotation state document
    pub state_path: PathBuf,

    /// Recent-emissions log document
    pub history_path: PathBuf,

    /// Byte cap applied to each document
    pub max_bytes: u64,

    /// Number of emissions kept in the log
    pub history_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("state/rotation_state.json"),
            history_path: PathBuf::from("state/recent_emissions.json"),
            max_bytes: DEFAULT_MAX_BYTES,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables, defaulting the rest
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("PINWHEEL_CATALOG_DIR") {
            config.catalog.directory = dir.into();
        }
        if let Ok(exts) = std::env::var("PINWHEEL_EXTENSIONS") {
            config.catalog.extensions = exts
                .split(',')
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect();
        }

        if let Ok(path) = std::env::var("PINWHEEL_STATE_PATH") {
            config.storage.state_path = path.into();
        }
        if let Ok(path) = std::env::var("PINWHEEL_HISTORY_PATH") {
            config.storage.history_path = path.into();
        }
        if let Some(bytes) = env_parse("PINWHEEL_MAX_STATE_BYTES") {
            config.storage.max_bytes = bytes;
        }
        if let Some(cap) = env_parse("PINWHEEL_HISTORY_CAPACITY") {
            config.storage.history_capacity = cap;
        }

        if let Some(fraction) = env_parse("PINWHEEL_EXCLUSION_FRACTION") {
            config.rotation.exclusion_fraction = fraction;
        }
        if let Some(ceiling) = env_parse("PINWHEEL_EXCLUSION_CEILING") {
            config.rotation.exclusion_ceiling = ceiling;
        }
        if let Some(threshold) = env_parse("PINWHEEL_DRIFT_THRESHOLD") {
            config.rotation.drift_threshold = threshold;
        }

        if let Some(window) = env_parse("PINWHEEL_CLUSTER_WINDOW") {
            config.clustering.window = window;
        }

        match std::env::var("PINWHEEL_STRATEGY").ok().as_deref() {
            Some("weighted") => config.selection.strategy = SelectionStrategy::Weighted,
            Some("uniform") => config.selection.strategy = SelectionStrategy::Uniform,
            Some(other) => anyhow::bail!("unknown PINWHEEL_STRATEGY '{other}'"),
            None => {}
        }

        if let Ok(level) = std::env::var("PINWHEEL_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("PINWHEEL_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.catalog.extensions.is_empty() {
            return Err(Error::config("catalog.extensions must not be empty"));
        }

        let fraction = self.rotation.exclusion_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(Error::config(format!(
                "rotation.exclusion_fraction must be in (0, 1], got {fraction}"
            )));
        }
        if self.rotation.exclusion_ceiling == 0 {
            return Err(Error::config("rotation.exclusion_ceiling must be greater than 0"));
        }

        if self.clustering.window == 0 || self.clustering.window > self.storage.history_capacity {
            return Err(Error::config(format!(
                "clustering.window must be between 1 and storage.history_capacity ({})",
                self.storage.history_capacity
            )));
        }

        if !(self.selection.decay > 0.0 && self.selection.decay < 1.0) {
            return Err(Error::config("selection.decay must be in (0, 1)"));
        }

        if self.storage.max_bytes < 1024 {
            return Err(Error::config("storage.max_bytes must be at least 1024"));
        }
        if self.storage.history_capacity == 0 {
            return Err(Error::config("storage.history_capacity must be greater than 0"));
        }

        for group in &self.seasonal.groups {
            if group.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(Error::config(format!(
                    "seasonal group '{}' has no keywords",
                    group.name
                )));
            }
            if let Some(bad) = group.months.iter().find(|m| !(1..=12).contains(*m)) {
                return Err(Error::config(format!(
                    "seasonal group '{}' has invalid month {bad}",
                    group.name
                )));
            }
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(Error::config("logging.format must be 'text' or 'json'"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_fraction() {
        let mut config = Config::default();
        config.rotation.exclusion_fraction = 0.0;
        assert!(config.validate().is_err());

        config.rotation.exclusion_fraction = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_window_bounded_by_history() {
        let mut config = Config::default();
        config.clustering.window = 0;
        assert!(config.validate().is_err());

        config.clustering.window = config.storage.history_capacity + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_reports_config_error() {
        let mut config = Config::default();
        config.logging.format = String::from("yaml");

        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("logging.format"));
    }

    #[test]
    fn test_invalid_seasonal_month() {
        let mut config = Config::default();
        config.seasonal.groups[0].months = vec![13];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [clustering]
            window = 6

            [selection]
            strategy = "weighted"
            "#,
        )
        .unwrap();

        assert_eq!(config.clustering.window, 6);
        assert_eq!(config.clustering.relaxed_window, 1);
        assert_eq!(config.selection.strategy, SelectionStrategy::Weighted);
        assert_eq!(config.rotation.exclusion_ceiling, 2000);
        assert_eq!(config.seasonal.groups.len(), 2);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        std::env::set_var("PINWHEEL_CATALOG_DIR", "/srv/queue");
        std::env::set_var("PINWHEEL_CLUSTER_WINDOW", "5");
        std::env::set_var("PINWHEEL_EXTENSIONS", ".JPG, png");

        let config = Config::from_env().unwrap();
        assert_eq!(config.catalog.directory, PathBuf::from("/srv/queue"));
        assert_eq!(config.clustering.window, 5);
        assert_eq!(config.catalog.extensions, vec!["jpg", "png"]);

        std::env::remove_var("PINWHEEL_CATALOG_DIR");
        std::env::remove_var("PINWHEEL_CLUSTER_WINDOW");
        std::env::remove_var("PINWHEEL_EXTENSIONS");
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_unknown_strategy() {
        std::env::set_var("PINWHEEL_STRATEGY", "loudest");
        assert!(Config::from_env().is_err());
        std::env::remove_var("PINWHEEL_STRATEGY");
    }
}
