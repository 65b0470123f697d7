//! Regressors
//!
//! The capability every base model wrapped by the conformal estimator must offer,
//! plus a reference least-squares implementation.
pub mod linear;

use crate::data::Matrix;
use crate::errors::MapieError;

pub use linear::LinearRegression;

/// A point regressor that can be fit on features and targets, then queried.
///
/// The conformal estimator clones an unfitted template once per resampling split,
/// so implementors must be cheap to clone before fitting and safe to move across
/// worker threads.
pub trait Regressor: Clone + Send + Sync {
    /// Fit the model, replacing any previous fit.
    ///
    /// * `data` - Features, one row per sample.
    /// * `y` - Targets, `data.rows` long.
    fn fit(&mut self, data: &Matrix<f64>, y: &[f64]) -> Result<(), MapieError>;

    /// Predict one value per row of `data`.
    fn predict(&self, data: &Matrix<f64>) -> Vec<f64>;
}
