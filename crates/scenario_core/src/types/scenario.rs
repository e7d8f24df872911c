//! What-if scenarios.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::ModelError;
use super::ids::ScenarioId;
use super::period::{Period, TimePeriodType};

/// A named what-if configuration.
///
/// Non-baseline scenarios are compared against the baseline scenario of the
/// same organization for the same period.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use scenario_core::types::{Scenario, TimePeriodType};
///
/// let scenario = Scenario::time_series(
///     "growth",
///     "Growth 5%",
///     TimePeriodType::Yearly,
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
/// );
/// assert_eq!(scenario.periods().unwrap().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Identifier
    pub id: ScenarioId,
    /// Display name
    pub name: String,
    /// Whether this scenario is the comparison reference
    #[serde(default)]
    pub is_baseline: bool,
    /// Period granularity
    #[serde(default)]
    pub time_period_type: TimePeriodType,
    /// Lower date bound, ignored for single point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Upper date bound, ignored for single point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl Scenario {
    /// Creates a non-time-series scenario.
    pub fn single_point(id: impl Into<ScenarioId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_baseline: false,
            time_period_type: TimePeriodType::SinglePoint,
            start_date: None,
            end_date: None,
        }
    }

    /// Creates a time-series scenario.
    pub fn time_series(
        id: impl Into<ScenarioId>,
        name: impl Into<String>,
        time_period_type: TimePeriodType,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_baseline: false,
            time_period_type,
            start_date: Some(start_date),
            end_date: Some(end_date),
        }
    }

    /// Marks the scenario as the baseline.
    pub fn as_baseline(mut self) -> Self {
        self.is_baseline = true;
        self
    }

    /// Lists the calculation periods this scenario covers.
    pub fn periods(&self) -> Result<Vec<Period>, ModelError> {
        if self.time_period_type == TimePeriodType::SinglePoint {
            return Ok(vec![Period::SinglePoint]);
        }
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => self.time_period_type.periods_between(start, end),
            _ => Err(ModelError::MissingDateBounds(self.name.clone())),
        }
    }
}
