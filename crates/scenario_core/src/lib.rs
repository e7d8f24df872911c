//! # scenario_core: Data Model for Scenario Calculations
//!
//! ## Layer 1 (Foundation) Role
//!
//! scenario_core is the bottom layer of the workspace and provides:
//! - Strongly-typed identifiers (`types::ids`)
//! - Parameters, variable definitions and stored input values (`types`)
//! - Scenarios and their calculation periods (`types::scenario`, `types::period`)
//! - The per-organization model container (`model`)
//! - Error types: `ModelError` (`types::error`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other scenario_* crates, with minimal external
//! dependencies:
//! - chrono: Period date arithmetic
//! - serde / serde_json / toml: Model files and boundary types
//! - thiserror: Error derivation
//!
//! ## Usage Examples
//!
//! ```rust
//! use scenario_core::model::OrganizationModel;
//! use scenario_core::types::{Parameter, Period, Scenario, VariableDefinition};
//!
//! let mut model = OrganizationModel::new("acme")
//!     .with_parameter(Parameter::new("PARAM_BASELINE_OMZET", 1_000_000.0))
//!     .with_variable(VariableDefinition::input("INPUT_OMZET"))
//!     .with_variable(VariableDefinition::output(
//!         "OUTPUT_OMZET_PERCENTAGE",
//!         "(INPUT_OMZET / PARAM_BASELINE_OMZET) * 100",
//!         ["INPUT_OMZET"],
//!     ))
//!     .with_scenario(Scenario::single_point("baseline", "Baseline").as_baseline());
//!
//! let baseline = model.baseline_scenario().unwrap().id.clone();
//! model
//!     .set_value(&baseline, "INPUT_OMZET", Period::SinglePoint, 1_000_000.0)
//!     .unwrap();
//!
//! assert_eq!(model.input_values_for(&baseline, &Period::SinglePoint).len(), 1);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod model;
pub mod types;

pub use model::OrganizationModel;
pub use types::{
    ModelError, OrganizationId, Parameter, ParameterId, Period, Scenario, ScenarioId,
    TimePeriodType, VariableDefinition, VariableId, VariableType, VariableValue,
};
