//! Estimator Configuration
//!
//! Defines the configuration of the conformal estimator and the JSON persistence trait
//! shared by the configuration and fitted estimators.
use crate::conformal::method::{Method, PointPrediction, Resampling};
use crate::errors::MapieError;
use crate::utils::{validate_min_count, validate_open_interval};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_alpha() -> f64 {
    0.1
}
fn default_n_splits() -> usize {
    10
}
fn default_shuffle() -> bool {
    false
}
fn default_seed() -> u64 {
    0
}
fn default_num_threads() -> Option<usize> {
    None
}

/// Configuration for the `MapieRegressor`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapieConfig {
    /// Interval estimation method.
    #[serde(default)]
    pub method: Method,
    /// Miscoverage level, strictly between 0 and 1.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Number of folds for the CV methods. Ignored by the others.
    #[serde(default = "default_n_splits")]
    pub n_splits: usize,
    /// Whether to permute samples before assigning folds.
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
    /// Seed for the fold permutation.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Point prediction strategy for methods that keep per-split models.
    #[serde(default)]
    pub point_prediction: PointPrediction,
    /// Number of threads used to fit split models.
    #[serde(default = "default_num_threads")]
    pub num_threads: Option<usize>,
}

impl Default for MapieConfig {
    fn default() -> Self {
        MapieConfig {
            method: Method::JackknifePlus,
            alpha: default_alpha(),
            n_splits: default_n_splits(),
            shuffle: default_shuffle(),
            seed: default_seed(),
            point_prediction: PointPrediction::Median,
            num_threads: default_num_threads(),
        }
    }
}

impl MapieConfig {
    /// Check the parameters that do not depend on the training data.
    ///
    /// A fold count of zero is reported as invalid input, any other count below two
    /// as an invalid configuration.
    pub fn validate(&self) -> Result<(), MapieError> {
        validate_open_interval(self.alpha, 0.0, 1.0, "alpha")?;
        if self.method.resampling() == Resampling::KFold {
            if self.n_splits == 0 {
                return Err(MapieError::Validation(
                    "n_splits must be a positive number of folds, got 0".to_string(),
                ));
            }
            validate_min_count(self.n_splits, 2, "n_splits")?;
        }
        if let Some(0) = self.num_threads {
            return Err(MapieError::Configuration(
                "num_threads".to_string(),
                "a positive thread count or None".to_string(),
                "0".to_string(),
            ));
        }
        Ok(())
    }
}

/// IO
pub trait ModelIO: Serialize + DeserializeOwned + Sized {
    /// Save an object as json to a file.
    ///
    /// * `path` - Path to save to.
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), MapieError> {
        fs::write(path, self.json_dump()?).map_err(|e| MapieError::UnableToWrite(e.to_string()))
    }

    /// Dump an object as a json string.
    fn json_dump(&self) -> Result<String, MapieError> {
        serde_json::to_string(self).map_err(|e| MapieError::UnableToWrite(e.to_string()))
    }

    /// Load an object from a json string.
    ///
    /// * `json_str` - String object, which can be serialized to json.
    fn from_json(json_str: &str) -> Result<Self, MapieError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| MapieError::UnableToRead(e.to_string()))
    }

    /// Load an object from a path to a json file.
    ///
    /// * `path` - Path to load from.
    fn load<P: AsRef<Path>>(path: P) -> Result<Self, MapieError> {
        let json_str = fs::read_to_string(path).map_err(|e| MapieError::UnableToRead(e.to_string()))?;
        Self::from_json(&json_str)
    }
}

impl ModelIO for MapieConfig {}
