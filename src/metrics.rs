//! Metrics
//!
//! Evaluation of prediction intervals against observed targets.
use crate::conformal::PredictionInterval;

/// Fraction of targets falling inside their interval, bounds included.
/// NaN when there are no intervals or the lengths differ.
///
/// * `y` - Observed targets.
/// * `intervals` - Predicted intervals, one per target.
pub fn coverage_score(y: &[f64], intervals: &[PredictionInterval]) -> f64 {
    if intervals.is_empty() || y.len() != intervals.len() {
        return f64::NAN;
    }
    let covered = y
        .iter()
        .zip(intervals)
        .filter(|(y_, interval)| interval.contains(**y_))
        .count();
    covered as f64 / intervals.len() as f64
}

/// Average `upper - lower`, NaN when there are no intervals.
pub fn mean_width(intervals: &[PredictionInterval]) -> f64 {
    if intervals.is_empty() {
        return f64::NAN;
    }
    intervals.iter().map(|i| i.width()).sum::<f64>() / intervals.len() as f64
}
