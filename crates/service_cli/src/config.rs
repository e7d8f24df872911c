//! CLI configuration management
//!
//! Handles loading configuration from environment variables, TOML files, and CLI arguments.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use scenario_engine::EngineConfig;

use crate::output::OutputFormat;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid output format: {0}. Must be one of: table, json, csv")]
    InvalidFormat(String),

    #[error("Configuration file error: {0}")]
    FileError(String),

    #[error("Environment variable error: {0}")]
    EnvError(String),

    #[error(transparent)]
    Engine(#[from] scenario_engine::ConfigError),
}

/// Log levels supported by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// CLI configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Log level used when `RUST_LOG` is not set
    pub log_level: LogLevel,
    /// Output format used when `--format` is not given
    pub output_format: OutputFormat,
    /// Calculation engine settings
    pub engine: EngineConfig,
}

/// Environment variable names
const ENV_LOG_LEVEL: &str = "SCENARIO_LOG_LEVEL";
const ENV_OUTPUT_FORMAT: &str = "SCENARIO_OUTPUT_FORMAT";
const ENV_DECIMAL_PLACES: &str = "SCENARIO_DECIMAL_PLACES";
const ENV_CACHE_ENABLED: &str = "SCENARIO_CACHE_ENABLED";
const ENV_PARALLEL_THRESHOLD: &str = "SCENARIO_PARALLEL_THRESHOLD";

impl CliConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("Failed to read config file: {}", e)))?;

        let config: CliConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Apply `SCENARIO_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = LogLevel::from_str(&level)?;
        }

        if let Some(format) = lookup(ENV_OUTPUT_FORMAT) {
            self.output_format = OutputFormat::from_str(&format)
                .map_err(|_| ConfigError::InvalidFormat(format.clone()))?;
        }

        if let Some(places) = lookup(ENV_DECIMAL_PLACES) {
            self.engine.decimal_places = if places.trim().is_empty() {
                None
            } else {
                Some(places.trim().parse().map_err(|_| {
                    ConfigError::EnvError(format!("{} must be a number, got '{}'", ENV_DECIMAL_PLACES, places))
                })?)
            };
        }

        if let Some(enabled) = lookup(ENV_CACHE_ENABLED) {
            self.engine.cache_enabled = enabled.to_lowercase() == "true";
        }

        if let Some(threshold) = lookup(ENV_PARALLEL_THRESHOLD) {
            self.engine.parallel_threshold = threshold.trim().parse().map_err(|_| {
                ConfigError::EnvError(format!(
                    "{} must be a number, got '{}'",
                    ENV_PARALLEL_THRESHOLD, threshold
                ))
            })?;
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        Ok(())
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliArgs) -> Result<(), ConfigError> {
        if let Some(level) = &cli.log_level {
            self.log_level = LogLevel::from_str(level)?;
        } else if cli.verbose {
            self.log_level = LogLevel::Debug;
        }
        if let Some(places) = cli.decimal_places {
            self.engine.decimal_places = Some(places);
        }
        if cli.no_cache {
            self.engine.cache_enabled = false;
        }
        Ok(())
    }
}

/// CLI arguments relevant to configuration
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Log level override
    pub log_level: Option<String>,
    /// `--verbose` flag
    pub verbose: bool,
    /// Rounding override
    pub decimal_places: Option<u32>,
    /// `--no-cache` flag
    pub no_cache: bool,
}

/// Build configuration from all sources
///
/// Priority (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables
/// 3. Config file
/// 4. Default values
pub fn build_config(cli: &CliArgs) -> Result<CliConfig, ConfigError> {
    build_config_with(cli, |key| std::env::var(key).ok())
}

/// [`build_config`] with an explicit environment lookup.
pub fn build_config_with<F>(cli: &CliArgs, lookup: F) -> Result<CliConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // Start with defaults or file config
    let mut config = match &cli.config_file {
        Some(path) => CliConfig::from_file(path)?,
        None => CliConfig::default(),
    };

    // Override with environment variables
    config.apply_env(lookup)?;

    // Override with CLI arguments
    config.merge_with_cli(cli)?;

    // Final validation
    config.validate()?;

    Ok(config)
}
