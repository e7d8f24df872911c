//! Calculation result types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use scenario_core::types::{OrganizationId, Period, ScenarioId};

use crate::error::EngineError;

/// Lifecycle of a single calculation run.
///
/// ```text
/// Pending ──► Evaluating ──► Completed
///    │            ├────────► CompletedWithErrors
///    └────────────┴────────► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalculationStatus {
    /// Not started
    #[default]
    Pending,
    /// Variables are being evaluated
    Evaluating,
    /// Every OUTPUT evaluated
    Completed,
    /// Some variables failed; the rest evaluated
    CompletedWithErrors,
    /// Graph-level failure; nothing evaluated
    Failed,
}

impl CalculationStatus {
    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CalculationStatus::Completed
                | CalculationStatus::CompletedWithErrors
                | CalculationStatus::Failed
        )
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: CalculationStatus) -> bool {
        use CalculationStatus::*;
        matches!(
            (self, next),
            (Pending, Evaluating)
                | (Pending, Failed)
                | (Evaluating, Completed)
                | (Evaluating, CompletedWithErrors)
                | (Evaluating, Failed)
        )
    }

    /// Moves to `next`, rejecting illegal transitions.
    pub fn transition(self, next: CalculationStatus) -> Result<CalculationStatus, EngineError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(EngineError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for CalculationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CalculationStatus::Pending => "PENDING",
            CalculationStatus::Evaluating => "EVALUATING",
            CalculationStatus::Completed => "COMPLETED",
            CalculationStatus::CompletedWithErrors => "COMPLETED_WITH_ERRORS",
            CalculationStatus::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

/// Category of a logged calculation problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    /// INPUT variable has no value for the period
    MissingInput,
    /// Formula text is malformed
    ParseError,
    /// Formula references a name absent from the environment
    UnknownIdentifier,
    /// Formula divided by zero
    DivisionByZero,
    /// Formula overflowed to infinity or NaN
    NonFinite,
    /// Skipped because a dependency failed
    DependencyFailed,
    /// Variables form a cycle
    CircularDependency,
    /// Two variables share a name
    DuplicateVariable,
    /// No OUTPUT variables to evaluate
    NoOutputs,
    /// INPUT variables exist but no values were supplied
    NoInputs,
}

impl IssueKind {
    /// Whether this kind fails the whole run.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            IssueKind::CircularDependency
                | IssueKind::DuplicateVariable
                | IssueKind::NoOutputs
                | IssueKind::NoInputs
        )
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueKind::MissingInput => "MISSING_INPUT",
            IssueKind::ParseError => "PARSE_ERROR",
            IssueKind::UnknownIdentifier => "UNKNOWN_IDENTIFIER",
            IssueKind::DivisionByZero => "DIVISION_BY_ZERO",
            IssueKind::NonFinite => "NON_FINITE",
            IssueKind::DependencyFailed => "DEPENDENCY_FAILED",
            IssueKind::CircularDependency => "CIRCULAR_DEPENDENCY",
            IssueKind::DuplicateVariable => "DUPLICATE_VARIABLE",
            IssueKind::NoOutputs => "NO_OUTPUTS",
            IssueKind::NoInputs => "NO_INPUTS",
        };
        write!(f, "{}", s)
    }
}

/// One entry of the error log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationIssue {
    /// Variable the problem is attached to; empty for run-level issues
    pub variable_name: String,
    /// Problem category
    pub kind: IssueKind,
    /// Human-readable description
    pub message: String,
}

impl CalculationIssue {
    /// Creates an issue.
    pub fn new(variable_name: impl Into<String>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            variable_name: variable_name.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Outcome for one OUTPUT variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariableResult {
    /// Reported value, rounded when the engine rounds
    pub value: f64,
    /// Unrounded value; present only when rounding is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_value: Option<f64>,
    /// `value - baseline_value`, when a baseline exists
    pub delta: Option<f64>,
    /// `delta / baseline_value * 100`; `None` without baseline or when it is zero
    pub percent_change: Option<f64>,
    /// Baseline value for the same variable and period
    pub baseline_value: Option<f64>,
}

impl VariableResult {
    /// Builds a result from the unrounded value, rounding when `decimal_places` is set.
    pub fn from_raw(raw: f64, decimal_places: Option<u32>) -> Self {
        match decimal_places {
            Some(places) => Self {
                value: crate::delta::round_to(raw, places),
                raw_value: Some(raw),
                delta: None,
                percent_change: None,
                baseline_value: None,
            },
            None => Self {
                value: raw,
                raw_value: None,
                delta: None,
                percent_change: None,
                baseline_value: None,
            },
        }
    }

    /// Unrounded value.
    #[inline]
    pub fn raw(&self) -> f64 {
        self.raw_value.unwrap_or(self.value)
    }
}

/// Outcome of one calculation run for a (scenario, period).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// Organization the run belongs to
    pub organization_id: OrganizationId,
    /// Scenario evaluated
    pub scenario_id: ScenarioId,
    /// Period evaluated
    pub period: Period,
    /// Final status
    pub status: CalculationStatus,
    /// Successfully evaluated OUTPUT variables
    pub results: BTreeMap<String, VariableResult>,
    /// True when `error_log` is non-empty
    pub has_errors: bool,
    /// Per-variable and run-level problems
    pub error_log: Vec<CalculationIssue>,
    /// Wall-clock duration in milliseconds
    pub execution_time_ms: f64,
    /// SHA-256 over everything that determined this result
    pub fingerprint: String,
    /// Whether this result was served from the cache
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
}

impl CalculationResult {
    /// Value of an OUTPUT variable, if it evaluated.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.results.get(name).map(|r| r.value)
    }

    /// Whether the run reached a non-failed terminal state.
    pub fn is_success(&self) -> bool {
        matches!(
            self.status,
            CalculationStatus::Completed | CalculationStatus::CompletedWithErrors
        )
    }

    /// Serialises to pretty JSON.
    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CalculationStatus::*;

    #[test]
    fn test_legal_transitions() {
        assert_eq!(Pending.transition(Evaluating).unwrap(), Evaluating);
        assert_eq!(Evaluating.transition(Completed).unwrap(), Completed);
        assert_eq!(
            Evaluating.transition(CompletedWithErrors).unwrap(),
            CompletedWithErrors
        );
        assert_eq!(Pending.transition(Failed).unwrap(), Failed);
    }

    #[test]
    fn test_illegal_transitions() {
        for (from, to) in [
            (Pending, Completed),
            (Completed, Evaluating),
            (Failed, Pending),
            (Evaluating, Pending),
            (CompletedWithErrors, Completed),
        ] {
            let err = from.transition(to).unwrap_err();
            assert!(matches!(err, EngineError::InvalidTransition { .. }));
        }
        assert_eq!(
            format!("{}", Completed.transition(Evaluating).unwrap_err()),
            "Invalid status transition: COMPLETED -> EVALUATING"
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(!Pending.is_terminal());
        assert!(!Evaluating.is_terminal());
        assert!(Completed.is_terminal());
        assert!(Failed.is_terminal());
    }

    #[test]
    fn test_variable_result_rounding() {
        let unrounded = VariableResult::from_raw(94.549999, None);
        assert_eq!(unrounded.value, 94.549999);
        assert_eq!(unrounded.raw_value, None);

        let rounded = VariableResult::from_raw(94.549999, Some(2));
        assert_eq!(rounded.value, 94.55);
        assert_eq!(rounded.raw(), 94.549999);
    }

    #[test]
    fn test_serialised_shape() {
        let result = CalculationResult {
            organization_id: OrganizationId::new("acme"),
            scenario_id: ScenarioId::new("baseline"),
            period: Period::SinglePoint,
            status: Completed,
            results: BTreeMap::from([(
                "OUTPUT_X".to_string(),
                VariableResult::from_raw(1.5, None),
            )]),
            has_errors: false,
            error_log: vec![CalculationIssue::new(
                "OUTPUT_Y",
                IssueKind::DivisionByZero,
                "Division by zero",
            )],
            execution_time_ms: 0.25,
            fingerprint: "abc".to_string(),
            cached: false,
        };
        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["status"], "COMPLETED");
        assert_eq!(json["period"], "single");
        assert_eq!(json["results"]["OUTPUT_X"]["value"], 1.5);
        assert!(json["results"]["OUTPUT_X"]["delta"].is_null());
        assert!(json["results"]["OUTPUT_X"].get("raw_value").is_none());
        assert_eq!(json["error_log"][0]["kind"], "DIVISION_BY_ZERO");
        assert!(json.get("cached").is_none());
    }
}
