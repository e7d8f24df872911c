//! Engine configuration.
//!
//! Loaded from the `[engine]` table of a TOML file or built in code.
//! Environment overrides are applied by the CLI layer.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest supported rounding precision.
pub const MAX_DECIMAL_PLACES: u32 = 12;

/// Configuration error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Rounding precision beyond [`MAX_DECIMAL_PLACES`].
    #[error("Invalid decimal places: {0}. Must be at most {max}", max = MAX_DECIMAL_PLACES)]
    InvalidDecimalPlaces(u32),

    /// Config file could not be read or parsed.
    #[error("Configuration file error: {0}")]
    FileError(String),
}

/// Calculation engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Round reported values to this many decimal places. `None` keeps full precision.
    pub decimal_places: Option<u32>,
    /// Reuse results whose input fingerprint is unchanged
    pub cache_enabled: bool,
    /// Minimum number of scenarios in a period before a batch fans out
    pub parallel_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decimal_places: None,
            cache_enabled: true,
            parallel_threshold: 2,
        }
    }
}

impl EngineConfig {
    /// Parses a config from TOML text.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(source)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Sets rounding precision.
    pub fn with_decimal_places(mut self, places: u32) -> Self {
        self.decimal_places = Some(places);
        self
    }

    /// Disables the result cache.
    pub fn without_cache(mut self) -> Self {
        self.cache_enabled = false;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.decimal_places {
            Some(places) if places > MAX_DECIMAL_PLACES => {
                Err(ConfigError::InvalidDecimalPlaces(places))
            }
            _ => Ok(()),
        }
    }

    /// Returns whether to run `n_scenarios` in parallel.
    #[inline]
    pub fn should_parallelize(&self, n_scenarios: usize) -> bool {
        n_scenarios >= self.parallel_threshold.max(2)
    }
}
