use crate::errors::MapieError;
use std::cmp::Ordering;

/// Create a string of all available items.
pub fn items_to_strings(items: Vec<&str>) -> String {
    let mut s = String::new();
    for i in items {
        s.push_str(i);
        s.push_str(", ");
    }
    let s = s.strip_suffix(", ").unwrap_or(&s).to_string();
    s
}

// Validation
/// Check that `value` lies strictly between `min` and `max`.
pub fn validate_open_interval(value: f64, min: f64, max: f64, parameter: &str) -> Result<(), MapieError> {
    if value.is_nan() || value <= min || max <= value {
        let ex_msg = format!("real value strictly between {} and {}", min, max);
        Err(MapieError::Configuration(
            parameter.to_string(),
            ex_msg,
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Check that a count is at least `min`.
pub fn validate_min_count(value: usize, min: usize, parameter: &str) -> Result<(), MapieError> {
    if value < min {
        Err(MapieError::Configuration(
            parameter.to_string(),
            format!("an integer of at least {}", min),
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Index of the first non-finite value, if any.
#[inline]
pub fn first_non_finite(values: &[f64]) -> Option<usize> {
    values.iter().position(|v| !v.is_finite())
}

/// Sort a copy of the values in ascending order.
/// NaN values compare equal to everything, callers filter them beforehand.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    v
}

/// Empirical quantile of an already sorted slice.
///
/// Linear interpolation between order statistics: with `m` values and level `q`,
/// `h = (m - 1) * q` and the result is `x[floor(h)] + (h - floor(h)) * (x[floor(h) + 1] - x[floor(h)])`.
/// Returns NaN for an empty slice.
///
/// * `sorted_values` - Values in ascending order.
/// * `q` - Level in `[0, 1]`, clamped.
pub fn quantile_sorted(sorted_values: &[f64], q: f64) -> f64 {
    let m = sorted_values.len();
    if m == 0 {
        return f64::NAN;
    }
    let h = (m - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(m - 1);
    let frac = h - lo as f64;
    let low_value = sorted_values[lo];
    if frac == 0.0 {
        low_value
    } else {
        low_value + frac * (sorted_values[hi] - low_value)
    }
}

/// Empirical quantile of unsorted values, see [`quantile_sorted`].
pub fn quantile(values: &[f64], q: f64) -> f64 {
    quantile_sorted(&sorted(values), q)
}

/// Median, the 0.5 quantile under the same interpolation rule.
pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

/// Arithmetic mean, NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
