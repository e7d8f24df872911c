//! Model types shared by every layer of the engine.
//!
//! This module provides:
//! - `ids`: Newtype identifiers for organizations, scenarios, variables and parameters
//! - `parameter`: Organization-wide named constants
//! - `variable`: INPUT / OUTPUT variable definitions
//! - `value`: Stored observations of INPUT variables
//! - `scenario`: What-if configurations with their time granularity
//! - `period`: Calculation periods and period expansion
//! - `error`: Structured error type for model construction and loading
//!
//! # Re-exports
//!
//! Commonly used types are re-exported at this module level.

pub mod error;
pub mod ids;
pub mod parameter;
pub mod period;
pub mod scenario;
pub mod value;
pub mod variable;

pub use error::ModelError;
pub use ids::{OrganizationId, ParameterId, ScenarioId, VariableId};
pub use parameter::Parameter;
pub use period::{Period, TimePeriodType};
pub use scenario::Scenario;
pub use value::VariableValue;
pub use variable::{VariableDefinition, VariableType};
