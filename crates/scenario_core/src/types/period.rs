//! Calculation periods.
//!
//! This module provides:
//! - `TimePeriodType`: Granularity of a scenario (single point, monthly, quarterly, yearly)
//! - `Period`: A single calculation window, or the sentinel period of a
//!   non-time-series scenario
//! - Period expansion from a pair of date bounds
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use scenario_core::types::{Period, TimePeriodType};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap();
//!
//! let quarters = TimePeriodType::Quarterly.periods_between(start, end).unwrap();
//! assert_eq!(quarters.len(), 4);
//! assert_eq!(quarters[0].to_string(), "2024-01-01..2024-03-31");
//! ```

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ModelError;

/// Granularity of a scenario's calculation periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimePeriodType {
    /// One calculation, no time axis. Date bounds are ignored.
    #[default]
    SinglePoint,
    /// Calendar months
    Monthly,
    /// Calendar quarters
    Quarterly,
    /// Calendar years
    Yearly,
}

impl TimePeriodType {
    /// Number of months spanned by one period, `None` for single point.
    pub fn months(&self) -> Option<u32> {
        match self {
            TimePeriodType::SinglePoint => None,
            TimePeriodType::Monthly => Some(1),
            TimePeriodType::Quarterly => Some(3),
            TimePeriodType::Yearly => Some(12),
        }
    }

    /// First day of the period containing `date`.
    fn period_start(&self, date: NaiveDate) -> NaiveDate {
        let month = match self {
            TimePeriodType::SinglePoint | TimePeriodType::Monthly => date.month(),
            TimePeriodType::Quarterly => ((date.month() - 1) / 3) * 3 + 1,
            TimePeriodType::Yearly => 1,
        };
        // day 1 of a month that exists in the same year is always valid
        date.with_day(1)
            .and_then(|d| d.with_month(month))
            .unwrap_or(date)
    }

    /// Expands `[start, end]` into consecutive calendar periods.
    ///
    /// The first period is aligned to the calendar boundary that contains
    /// `start`; the last period is the one containing `end`. Single point
    /// always yields the sentinel period.
    ///
    /// # Errors
    ///
    /// `ModelError::InvalidDateRange` if `end < start`.
    pub fn periods_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Period>, ModelError> {
        let Some(step) = self.months() else {
            return Ok(vec![Period::SinglePoint]);
        };
        if end < start {
            return Err(ModelError::InvalidDateRange { start, end });
        }

        let mut periods = Vec::new();
        let mut cursor = self.period_start(start);
        while cursor <= end {
            let next = cursor
                .checked_add_months(Months::new(step))
                .ok_or(ModelError::InvalidDateRange { start, end })?;
            let last = next.pred_opt().unwrap_or(next);
            periods.push(Period::Range {
                start: cursor,
                end: last,
            });
            cursor = next;
        }
        Ok(periods)
    }
}

impl fmt::Display for TimePeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimePeriodType::SinglePoint => write!(f, "SINGLE_POINT"),
            TimePeriodType::Monthly => write!(f, "MONTHLY"),
            TimePeriodType::Quarterly => write!(f, "QUARTERLY"),
            TimePeriodType::Yearly => write!(f, "YEARLY"),
        }
    }
}

/// A calculation window.
///
/// Serialises as a string: `"single"` for the sentinel period and
/// `"YYYY-MM-DD..YYYY-MM-DD"` (both bounds inclusive) for ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Period {
    /// The only period of a non-time-series scenario.
    SinglePoint,
    /// An inclusive date range.
    Range {
        /// First day of the period
        start: NaiveDate,
        /// Last day of the period
        end: NaiveDate,
    },
}

impl Period {
    /// Creates a range period, rejecting `end < start`.
    pub fn range(start: NaiveDate, end: NaiveDate) -> Result<Self, ModelError> {
        if end < start {
            return Err(ModelError::InvalidDateRange { start, end });
        }
        Ok(Period::Range { start, end })
    }

    /// Returns the start date, `None` for the sentinel period.
    pub fn start(&self) -> Option<NaiveDate> {
        match self {
            Period::SinglePoint => None,
            Period::Range { start, .. } => Some(*start),
        }
    }

    /// Returns the end date, `None` for the sentinel period.
    pub fn end(&self) -> Option<NaiveDate> {
        match self {
            Period::SinglePoint => None,
            Period::Range { end, .. } => Some(*end),
        }
    }

    /// Whether this is the sentinel period.
    pub fn is_single_point(&self) -> bool {
        matches!(self, Period::SinglePoint)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::SinglePoint => write!(f, "single"),
            Period::Range { start, end } => write!(f, "{}..{}", start, end),
        }
    }
}

impl FromStr for Period {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("single") {
            return Ok(Period::SinglePoint);
        }
        let (start, end) = trimmed
            .split_once("..")
            .ok_or_else(|| ModelError::InvalidPeriod(s.to_string()))?;
        let parse = |part: &str| {
            NaiveDate::parse_from_str(part.trim(), "%Y-%m-%d")
                .map_err(|_| ModelError::InvalidPeriod(s.to_string()))
        };
        Period::range(parse(start)?, parse(end)?)
    }
}

impl TryFrom<String> for Period {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}
