//! # scenario_engine: Scenario Orchestrator
//!
//! ## Layer 3 (Orchestration) Role
//!
//! Drives a calculation run for one (scenario, period) slot:
//!
//! ```text
//! CalculationContext ──► scenario_graph (order) ──► scenario_formula (per OUTPUT)
//!        │                                                   │
//!        └──────────── baseline CalculationResult ──► deltas ◄┘
//! ```
//!
//! Around the run it provides:
//! - Result caching keyed by an input fingerprint (`cache`, `fingerprint`)
//! - Persistence behind the `CalculationStore` trait (`store`)
//! - Batch runs across every scenario and period with Rayon (`batch`)
//! - Static model checks (`validation`)
//!
//! ## Usage Examples
//!
//! ```rust
//! use scenario_core::types::{Parameter, Period, VariableDefinition, VariableValue};
//! use scenario_engine::{
//!     CalculationContext, CalculationOptions, CalculationStatus, EngineConfig, ScenarioCalculator,
//! };
//!
//! let variables = vec![
//!     VariableDefinition::input("INPUT_OMZET"),
//!     VariableDefinition::output(
//!         "OUTPUT_OMZET_PERCENTAGE",
//!         "(INPUT_OMZET / PARAM_BASELINE_OMZET) * 100",
//!         ["INPUT_OMZET"],
//!     ),
//! ];
//! let parameters = vec![Parameter::new("PARAM_BASELINE_OMZET", 1_000_000.0)];
//! let values = vec![VariableValue::new("baseline", "INPUT_OMZET", Period::SinglePoint, 1_000_000.0)];
//!
//! let calculator = ScenarioCalculator::new(EngineConfig::default());
//! let result = calculator.run_calculation(
//!     &CalculationContext::new(&variables, &parameters, &values),
//!     &CalculationOptions::new("acme", "baseline", Period::SinglePoint),
//! );
//!
//! assert_eq!(result.status, CalculationStatus::Completed);
//! assert_eq!(result.value("OUTPUT_OMZET_PERCENTAGE"), Some(100.0));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod batch;
pub mod cache;
pub mod calculator;
pub mod config;
pub mod context;
pub mod delta;
pub mod error;
pub mod fingerprint;
pub mod result;
pub mod store;
pub mod validation;

pub use batch::{run_all, BatchReport, BatchRun, BatchSummary, SkippedScenario};
pub use cache::ResultCache;
pub use calculator::ScenarioCalculator;
pub use config::{ConfigError, EngineConfig};
pub use context::{CalculationContext, CalculationOptions};
pub use delta::{compute_delta, Delta};
pub use error::EngineError;
pub use result::{
    CalculationIssue, CalculationResult, CalculationStatus, IssueKind, VariableResult,
};
pub use store::{CalculationStore, InMemoryCalculationStore, StoreError, StoredCalculation};
pub use validation::{has_errors, validate_model, ModelIssue, Severity};
