//! Baseline comparison and rounding.

use crate::result::{CalculationResult, VariableResult};

/// Difference between a scenario value and its baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delta {
    /// `current - baseline`
    pub delta: f64,
    /// `delta / baseline * 100`; `None` when the baseline is zero or the
    /// ratio is not finite
    pub percent_change: Option<f64>,
}

/// Compares `current` against `baseline`.
///
/// Returns `None` when the difference itself overflows. Both fields of a
/// returned `Delta` are always finite.
///
/// # Examples
///
/// ```
/// use scenario_engine::delta::compute_delta;
///
/// let d = compute_delta(94.5, 100.0).unwrap();
/// assert!((d.delta + 5.5).abs() < 1e-12);
/// assert!((d.percent_change.unwrap() + 5.5).abs() < 1e-12);
///
/// assert_eq!(compute_delta(10.0, 0.0).unwrap().percent_change, None);
/// assert_eq!(compute_delta(1.0, 1e-310).unwrap().percent_change, None);
/// assert_eq!(compute_delta(f64::MAX, -f64::MAX), None);
/// ```
pub fn compute_delta(current: f64, baseline: f64) -> Option<Delta> {
    let delta = current - baseline;
    if !delta.is_finite() {
        return None;
    }
    let percent_change = if baseline == 0.0 {
        None
    } else {
        Some(delta / baseline * 100.0).filter(|p| p.is_finite())
    };
    Some(Delta {
        delta,
        percent_change,
    })
}

/// Rounds half away from zero to `places` decimals.
///
/// Values too large to scale are returned unchanged.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// Fills `delta`, `percent_change` and `baseline_value` on every result that
/// also appears in `baseline`.
///
/// A delta or percentage that cannot be represented as a finite number is
/// left as `None`.
///
/// Deltas are computed from unrounded values and then rounded alongside the
/// value when `decimal_places` is set.
pub(crate) fn apply_baseline(
    results: &mut std::collections::BTreeMap<String, VariableResult>,
    baseline: &CalculationResult,
    decimal_places: Option<u32>,
) {
    let round = |x: f64| decimal_places.map_or(x, |p| round_to(x, p));

    for (name, result) in results.iter_mut() {
        let Some(base) = baseline.results.get(name) else {
            continue;
        };
        let d = compute_delta(result.raw(), base.raw());
        result.delta = d.map(|d| round(d.delta));
        result.percent_change = d.and_then(|d| d.percent_change).map(round);
        result.baseline_value = Some(base.value);
    }
}
