//! Errors
//!
//! Custom error types used throughout the `mapie` crate.
use thiserror::Error;

/// Errors that can occur while fitting or querying a conformal estimator.
#[derive(Debug, Error)]
pub enum MapieError {
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    Configuration(String, String, String),
    /// Features and targets are inconsistent with each other or with the fitted state.
    #[error("Invalid input data: {0}")]
    Validation(String),
    /// Prediction was requested before the estimator was fit.
    #[error("This estimator is not fitted yet, call `fit` before `predict`.")]
    NotFitted,
    /// A resampling split could not produce a usable model or residual.
    #[error("Split {0} is degenerate: {1}")]
    DegenerateSplit(usize, String),
    /// The wrapped regressor failed to fit.
    #[error("Base regressor failed to fit: {0}")]
    RegressorFailure(String),
    /// Unable to write model to file.
    #[error("Unable to write model to file: {0}")]
    UnableToWrite(String),
    /// Unable to read model from file.
    #[error("Unable to read model from a file {0}")]
    UnableToRead(String),
}
