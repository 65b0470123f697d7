//! Estimator
//!
//! The `MapieRegressor` facade: validates inputs, runs the resampling engine at fit
//! time and the interval aggregator at prediction time.
use crate::conformal::aggregator::{
    ensemble_point, minmax_bounds, per_point_predictions, plus_bounds, residual_margin, symmetric,
};
use crate::conformal::config::{MapieConfig, ModelIO};
use crate::conformal::engine::{fit_full, fit_splits, in_sample, ResamplingState};
use crate::conformal::method::{Envelope, Method, PointPrediction, Resampling};
use crate::conformal::splitter::{KFold, LeaveOneOut, Splitter};
use crate::conformal::PredictionInterval;
use crate::data::Matrix;
use crate::errors::MapieError;
use crate::regressor::Regressor;
use crate::utils::{first_non_finite, validate_open_interval};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Instant;

/// State produced by `fit`. Prediction reads it and never changes it.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct FittedState<R> {
    method: Method,
    point_prediction: PointPrediction,
    n_features: usize,
    full_model: Option<R>,
    resampling: ResamplingState<R>,
}

/// Conformal prediction intervals around a base regressor.
///
/// ```
/// use mapie::{LinearRegression, MapieRegressor, Matrix, Method};
///
/// let x: Vec<f64> = (0..50).map(|i| i as f64 / 10.0).collect();
/// let y: Vec<f64> = x.iter().enumerate().map(|(i, v)| 2.0 * v + ((i * 7) % 5) as f64 * 0.1).collect();
/// let data = Matrix::new(&x, x.len(), 1);
///
/// let mut mapie = MapieRegressor::new(LinearRegression::default())
///     .set_method(Method::CvPlus)
///     .set_n_splits(5)
///     .set_alpha(0.1);
/// mapie.fit(&data, &y).unwrap();
/// let intervals = mapie.predict(&data, false).unwrap();
/// assert_eq!(intervals.len(), x.len());
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "R: Serialize", deserialize = "R: DeserializeOwned"))]
pub struct MapieRegressor<R> {
    pub cfg: MapieConfig,
    /// Unfitted template, cloned for the full-data fit and for every split.
    pub estimator: R,
    fitted: Option<FittedState<R>>,
}

impl<R: Regressor> MapieRegressor<R> {
    /// Wrap a regressor with the default configuration.
    ///
    /// * `estimator` - The base regressor; it is cloned, never fit in place.
    pub fn new(estimator: R) -> Self {
        Self::with_config(estimator, MapieConfig::default())
    }

    /// Wrap a regressor with an explicit configuration.
    pub fn with_config(estimator: R, cfg: MapieConfig) -> Self {
        MapieRegressor {
            cfg,
            estimator,
            fitted: None,
        }
    }

    /// Fit the base regressor and the resampling splits the configured method needs.
    /// Any previous fit is discarded, also when this call fails.
    ///
    /// * `data` - Training features.
    /// * `y` - Training targets, one per row of `data`.
    pub fn fit(&mut self, data: &Matrix<f64>, y: &[f64]) -> Result<(), MapieError> {
        self.fitted = None;
        self.cfg.validate()?;
        validate_training_data(data, y)?;

        let start = Instant::now();
        let method = self.cfg.method;
        let mut full_model = None;
        let resampling = match method.resampling() {
            Resampling::InSample => {
                let model = fit_full(&self.estimator, data, y)?;
                let state = in_sample(&model, data, y)?;
                full_model = Some(model);
                state
            }
            Resampling::LeaveOneOut => self.fit_resampled(&LeaveOneOut, data, y)?,
            Resampling::KFold => self.fit_resampled(&KFold::new(self.cfg.n_splits, self.cfg.shuffle), data, y)?,
        };
        let needs_full = !method.uses_split_models() || self.cfg.point_prediction == PointPrediction::Single;
        if full_model.is_none() && needs_full {
            full_model = Some(fit_full(&self.estimator, data, y)?);
        }

        info!(
            "Fitted {} on {} samples with {} splits in {:.3} seconds.",
            method,
            y.len(),
            resampling.n_splits,
            start.elapsed().as_secs_f64()
        );
        self.fitted = Some(FittedState {
            method,
            point_prediction: self.cfg.point_prediction,
            n_features: data.cols,
            full_model,
            resampling,
        });
        Ok(())
    }

    fn fit_resampled<S: Splitter>(
        &self,
        splitter: &S,
        data: &Matrix<f64>,
        y: &[f64],
    ) -> Result<ResamplingState<R>, MapieError> {
        let mut rng = StdRng::seed_from_u64(self.cfg.seed);
        let folds = splitter.split(&mut rng, y.len())?;
        let n_threads_available = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        let num_threads = self.cfg.num_threads.unwrap_or(n_threads_available);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map_err(|e| {
                MapieError::Configuration(
                    "num_threads".to_string(),
                    "a thread count the pool can be built with".to_string(),
                    format!("{} ({})", num_threads, e),
                )
            })?;
        fit_splits(
            &self.estimator,
            data,
            y,
            &folds,
            self.cfg.method.uses_split_models(),
            &pool,
        )
    }

    /// Predict intervals at the configured miscoverage level.
    ///
    /// * `data` - Query features, same columns as at fit time.
    /// * `parallel` - Evaluate split models and rows on the rayon global pool.
    pub fn predict(&self, data: &Matrix<f64>, parallel: bool) -> Result<Vec<PredictionInterval>, MapieError> {
        self.predict_with_alpha(data, self.cfg.alpha, parallel)
    }

    /// Predict intervals at another miscoverage level, reusing the same fit.
    ///
    /// * `data` - Query features, same columns as at fit time.
    /// * `alpha` - Miscoverage level, strictly between 0 and 1.
    /// * `parallel` - Evaluate split models and rows on the rayon global pool.
    pub fn predict_with_alpha(
        &self,
        data: &Matrix<f64>,
        alpha: f64,
        parallel: bool,
    ) -> Result<Vec<PredictionInterval>, MapieError> {
        validate_open_interval(alpha, 0.0, 1.0, "alpha")?;
        let fitted = self.fitted.as_ref().ok_or(MapieError::NotFitted)?;
        validate_query_data(data, fitted.n_features)?;
        if data.rows == 0 {
            return Ok(Vec::new());
        }

        let full_preds = fitted.full_model.as_ref().map(|m| m.predict(data));
        let resampling = &fitted.resampling;
        let intervals: Vec<PredictionInterval> = match fitted.method.envelope() {
            Envelope::Symmetric => {
                let points = full_preds.ok_or(MapieError::NotFitted)?;
                let margin = residual_margin(&resampling.residuals, alpha);
                points.iter().map(|p| symmetric(*p, margin)).collect()
            }
            Envelope::Plus => shifted_intervals(fitted, data, full_preds, parallel, |preds, residuals| {
                plus_bounds(preds, residuals, alpha)
            })?,
            Envelope::MinMax => shifted_intervals(fitted, data, full_preds, parallel, minmax_bounds)?,
        };

        let unordered = intervals.iter().filter(|i| !i.is_ordered()).count();
        if unordered > 0 {
            warn!(
                "{} of {} prediction intervals do not satisfy lower <= point <= upper.",
                unordered,
                intervals.len()
            );
        }
        Ok(intervals)
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Absolute residual of every training point, as used by the aggregator.
    pub fn residuals(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(|f| f.resampling.residuals.as_slice())
    }

    /// Number of resampling splits that were fit, zero for the naive method.
    pub fn n_splits_fitted(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.resampling.n_splits)
    }

    /// Per-split models kept for prediction, empty for symmetric methods.
    pub fn split_models(&self) -> Option<&[R]> {
        self.fitted.as_ref().map(|f| f.resampling.models.as_slice())
    }

    /// The model fit on the full training set, if the method needed one.
    pub fn full_model(&self) -> Option<&R> {
        self.fitted.as_ref().and_then(|f| f.full_model.as_ref())
    }
}

impl<R> ModelIO for MapieRegressor<R> where R: Regressor + Serialize + DeserializeOwned {}

fn validate_training_data(data: &Matrix<f64>, y: &[f64]) -> Result<(), MapieError> {
    if !data.is_consistent() {
        return Err(MapieError::Validation(format!(
            "features hold {} values, expected {} rows x {} columns",
            data.data.len(),
            data.rows,
            data.cols
        )));
    }
    if data.rows != y.len() {
        return Err(MapieError::Validation(format!(
            "features have {} rows but {} targets were provided",
            data.rows,
            y.len()
        )));
    }
    if data.rows == 0 || data.cols == 0 {
        return Err(MapieError::Validation(format!(
            "cannot fit on {} rows and {} columns",
            data.rows, data.cols
        )));
    }
    if let Some(i) = first_non_finite(y) {
        return Err(MapieError::Validation(format!("target at row {} is not finite", i)));
    }
    check_finite_features(data)
}

/// Intervals for methods built on the per-split models: each row gets bounds from the
/// shifted per-training-point predictions, and a point from the ensemble or full model.
fn shifted_intervals<R, F>(
    fitted: &FittedState<R>,
    data: &Matrix<f64>,
    full_preds: Option<Vec<f64>>,
    parallel: bool,
    bounds: F,
) -> Result<Vec<PredictionInterval>, MapieError>
where
    R: Regressor,
    F: Fn(&[f64], &[f64]) -> (f64, f64) + Sync,
{
    let resampling = &fitted.resampling;
    let split_preds: Vec<Vec<f64>> = if parallel {
        resampling.models.par_iter().map(|m| m.predict(data)).collect()
    } else {
        resampling.models.iter().map(|m| m.predict(data)).collect()
    };
    if let Some(k) = split_preds.iter().position(|p| p.len() != data.rows) {
        return Err(MapieError::DegenerateSplit(
            k,
            format!("model returned {} predictions for {} rows", split_preds[k].len(), data.rows),
        ));
    }
    let row_interval = |row: usize| {
        let at_row: Vec<f64> = split_preds.iter().map(|p| p[row]).collect();
        let point_preds = per_point_predictions(&at_row, &resampling.split_of);
        let (lower, upper) = bounds(&point_preds, &resampling.residuals);
        let point = ensemble_point(&point_preds, fitted.point_prediction)
            .or_else(|| full_preds.as_ref().map(|f| f[row]))
            .unwrap_or(f64::NAN);
        PredictionInterval { point, lower, upper }
    };
    Ok(if parallel {
        (0..data.rows).into_par_iter().map(row_interval).collect()
    } else {
        (0..data.rows).map(row_interval).collect()
    })
}

fn validate_query_data(data: &Matrix<f64>, n_features: usize) -> Result<(), MapieError> {
    if !data.is_consistent() {
        return Err(MapieError::Validation(format!(
            "features hold {} values, expected {} rows x {} columns",
            data.data.len(),
            data.rows,
            data.cols
        )));
    }
    if data.cols != n_features {
        return Err(MapieError::Validation(format!(
            "estimator was fit on {} features, got {}",
            n_features, data.cols
        )));
    }
    check_finite_features(data)
}

fn check_finite_features(data: &Matrix<f64>) -> Result<(), MapieError> {
    match first_non_finite(data.data) {
        Some(idx) => Err(MapieError::Validation(format!(
            "feature at row {}, column {} is not finite",
            idx % data.rows,
            idx / data.rows
        ))),
        None => Ok(()),
    }
}
