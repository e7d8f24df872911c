//! CLI error types.

use thiserror::Error;

use scenario_core::types::ModelError;
use scenario_engine::EngineError;
use scenario_graph::GraphError;

use crate::config::ConfigError;

/// Errors surfaced by `scenario` commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Input file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Bad command-line argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration could not be built.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Model file could not be loaded or queried.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Dependency graph is invalid.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Engine machinery failed.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// One or more calculation runs ended `FAILED`.
    #[error("{0} calculation run(s) failed")]
    CalculationFailed(usize),

    /// `validate` found errors.
    #[error("Model validation failed with {0} error(s)")]
    ValidationFailed(usize),

    /// Output could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV output failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result alias for CLI commands.
pub type Result<T> = std::result::Result<T, CliError>;
