//! Conformal Methods
//!
//! The seven interval estimation strategies and the point prediction strategy.
use crate::errors::MapieError;
use crate::utils::items_to_strings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How training residuals are produced.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Resampling {
    /// One model on the full training set, residuals measured on the same data.
    InSample,
    /// One model per excluded training point.
    LeaveOneOut,
    /// One model per excluded fold.
    KFold,
}

/// How residuals and per-split predictions are turned into bounds.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Envelope {
    /// Full-data prediction plus or minus a residual quantile.
    Symmetric,
    /// Quantiles of per-split predictions shifted by their residuals.
    Plus,
    /// Extremes of per-split predictions shifted by their residuals.
    MinMax,
}

/// Interval estimation method.
///
/// Under exchangeability of training and query points, jackknife+ and CV+ cover the
/// true value with probability at least `1 - 2 * alpha`, the minmax variants at least
/// `1 - alpha`. None of these guarantees hold for distribution-shifted queries: the
/// minmax variants are wider, not more correct, on out-of-distribution data.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// In-sample residuals of the full model. Optimistic, ignores the out-of-sample gap.
    Naive,
    /// Leave-one-out residuals around the full model.
    Jackknife,
    /// Leave-one-out predictions and residuals combined per training point.
    #[default]
    JackknifePlus,
    /// Leave-one-out min/max envelope.
    JackknifeMinmax,
    /// K-fold out-of-fold residuals around the full model.
    Cv,
    /// K-fold predictions and residuals combined per training point.
    CvPlus,
    /// K-fold min/max envelope.
    CvMinmax,
}

impl Method {
    /// All methods, in declaration order.
    pub const ALL: [Method; 7] = [
        Method::Naive,
        Method::Jackknife,
        Method::JackknifePlus,
        Method::JackknifeMinmax,
        Method::Cv,
        Method::CvPlus,
        Method::CvMinmax,
    ];

    pub fn resampling(&self) -> Resampling {
        match self {
            Method::Naive => Resampling::InSample,
            Method::Jackknife | Method::JackknifePlus | Method::JackknifeMinmax => Resampling::LeaveOneOut,
            Method::Cv | Method::CvPlus | Method::CvMinmax => Resampling::KFold,
        }
    }

    pub fn envelope(&self) -> Envelope {
        match self {
            Method::Naive | Method::Jackknife | Method::Cv => Envelope::Symmetric,
            Method::JackknifePlus | Method::CvPlus => Envelope::Plus,
            Method::JackknifeMinmax | Method::CvMinmax => Envelope::MinMax,
        }
    }

    /// Whether per-split models must be kept for prediction time.
    pub fn uses_split_models(&self) -> bool {
        self.envelope() != Envelope::Symmetric
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Naive => "naive",
            Method::Jackknife => "jackknife",
            Method::JackknifePlus => "jackknife_plus",
            Method::JackknifeMinmax => "jackknife_minmax",
            Method::Cv => "cv",
            Method::CvPlus => "cv_plus",
            Method::CvMinmax => "cv_minmax",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = MapieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "naive" => Ok(Method::Naive),
            "jackknife" => Ok(Method::Jackknife),
            "jackknife_plus" | "jackknife+" => Ok(Method::JackknifePlus),
            "jackknife_minmax" => Ok(Method::JackknifeMinmax),
            "cv" => Ok(Method::Cv),
            "cv_plus" | "cv+" => Ok(Method::CvPlus),
            "cv_minmax" => Ok(Method::CvMinmax),
            _ => Err(MapieError::Configuration(
                "method".to_string(),
                format!(
                    "one of {}",
                    items_to_strings(Method::ALL.iter().map(|m| m.as_str()).collect())
                ),
                s.to_string(),
            )),
        }
    }
}

/// Source of the point prediction for methods that keep per-split models.
/// Methods with a symmetric envelope always use the full-data model.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "snake_case")]
pub enum PointPrediction {
    /// A single model fit on the full training set.
    Single,
    /// Median of the per-training-point split predictions.
    #[default]
    Median,
    /// Mean of the per-training-point split predictions.
    Mean,
}

impl PointPrediction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointPrediction::Single => "single",
            PointPrediction::Median => "median",
            PointPrediction::Mean => "mean",
        }
    }
}

impl fmt::Display for PointPrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PointPrediction {
    type Err = MapieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(PointPrediction::Single),
            "median" => Ok(PointPrediction::Median),
            "mean" => Ok(PointPrediction::Mean),
            _ => Err(MapieError::Configuration(
                "point_prediction".to_string(),
                format!("one of {}", items_to_strings(vec!["single", "median", "mean"])),
                s.to_string(),
            )),
        }
    }
}
