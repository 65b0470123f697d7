//! Conformal Prediction
//!
//! Resampling-based prediction intervals around any [`Regressor`](crate::regressor::Regressor):
//! naive, jackknife, jackknife+, jackknife-minmax, CV, CV+ and CV-minmax.
//!
//! # Submodules
//!
//! * `splitter`: Leave-one-out and k-fold partitions of the training indices.
//! * `engine`: Fits per-split models and records out-of-split residuals.
//! * `aggregator`: Turns residuals and per-split predictions into bounds.
//! * `estimator`: The `MapieRegressor` facade.

pub mod aggregator;
pub mod config;
pub mod engine;
pub mod estimator;
pub mod method;
pub mod setters;
pub mod splitter;
#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

pub use config::{MapieConfig, ModelIO};
pub use estimator::MapieRegressor;
pub use method::{Method, PointPrediction};

/// Point prediction and bounds for one query row.
///
/// `lower <= point <= upper` holds except in degenerate cases, for example a full-data
/// point prediction falling outside a jackknife+ envelope, or `alpha` above 0.5.
/// Such rows are reported, never corrected; see [`PredictionInterval::is_ordered`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionInterval {
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

impl PredictionInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Whether `y` lies within the closed interval.
    pub fn contains(&self, y: f64) -> bool {
        self.lower <= y && y <= self.upper
    }

    /// Whether `lower <= point <= upper`.
    pub fn is_ordered(&self) -> bool {
        self.lower <= self.point && self.point <= self.upper
    }
}
