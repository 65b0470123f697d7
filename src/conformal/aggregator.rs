//! Interval Aggregator
//!
//! Pure functions turning residuals, and per-split predictions at a query point, into
//! a point prediction and bounds. Quantiles use linear interpolation between order
//! statistics (see [`crate::utils::quantile_sorted`]).
use crate::conformal::method::PointPrediction;
use crate::conformal::PredictionInterval;
use crate::utils::{mean, median, quantile, quantile_sorted, sorted};

/// Margin added on both sides of the full-data prediction: the `1 - alpha`
/// quantile of the absolute residuals.
pub fn residual_margin(residuals: &[f64], alpha: f64) -> f64 {
    quantile(residuals, 1.0 - alpha)
}

/// Margins for several levels, sorting the residuals once.
pub fn residual_margins(residuals: &[f64], alphas: &[f64]) -> Vec<f64> {
    let s = sorted(residuals);
    alphas.iter().map(|a| quantile_sorted(&s, 1.0 - a)).collect()
}

/// Interval centred on `point`.
#[inline]
pub fn symmetric(point: f64, margin: f64) -> PredictionInterval {
    PredictionInterval {
        point,
        lower: point - margin,
        upper: point + margin,
    }
}

/// Query predictions seen from each training point: the prediction at the query of the
/// model that held training point `i` out.
///
/// * `split_preds` - Prediction of every per-split model at one query point.
/// * `split_of` - Model index for every training point.
pub fn per_point_predictions(split_preds: &[f64], split_of: &[usize]) -> Vec<f64> {
    split_of.iter().map(|k| split_preds[*k]).collect()
}

/// Point prediction from the per-training-point predictions.
/// Returns `None` for [`PointPrediction::Single`], which needs the full-data model.
pub fn ensemble_point(point_preds: &[f64], strategy: PointPrediction) -> Option<f64> {
    match strategy {
        PointPrediction::Single => None,
        PointPrediction::Median => Some(median(point_preds)),
        PointPrediction::Mean => Some(mean(point_preds)),
    }
}

/// Plus bounds: the `alpha` quantile of `pred_i - R_i` and the `1 - alpha` quantile of
/// `pred_i + R_i` over the training points.
///
/// * `point_preds` - Per-training-point predictions at the query, see [`per_point_predictions`].
/// * `residuals` - Absolute out-of-split residual of every training point.
pub fn plus_bounds(point_preds: &[f64], residuals: &[f64], alpha: f64) -> (f64, f64) {
    let lows: Vec<f64> = point_preds.iter().zip(residuals).map(|(p, r)| p - r).collect();
    let highs: Vec<f64> = point_preds.iter().zip(residuals).map(|(p, r)| p + r).collect();
    (quantile(&lows, alpha), quantile(&highs, 1.0 - alpha))
}

/// Min/max bounds over the same populations as [`plus_bounds`]. Independent of `alpha`.
pub fn minmax_bounds(point_preds: &[f64], residuals: &[f64]) -> (f64, f64) {
    point_preds
        .iter()
        .zip(residuals)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (p, r)| {
            (lo.min(p - r), hi.max(p + r))
        })
}
