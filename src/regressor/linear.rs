//! Ordinary least squares with optional polynomial expansion of each feature.
use crate::data::Matrix;
use crate::errors::MapieError;
use crate::regressor::Regressor;
use serde::{Deserialize, Serialize};

// Relative size under which a Householder pivot is treated as zero.
const RANK_TOLERANCE: f64 = 1e-10;

fn default_degree() -> usize {
    1
}
fn default_fit_intercept() -> bool {
    true
}

/// Least squares regressor.
///
/// Each input feature `x` is expanded into `x, x^2, ..., x^degree` (no cross terms, so for a
/// single feature this is a full polynomial fit). Expanded columns are standardized before the
/// system is solved with a Householder QR decomposition, which keeps high degree fits
/// well conditioned. Columns that are linearly dependent on earlier ones get a zero coefficient.
///
/// Predicting with an unfitted model, or with a different number of features than it was fit
/// on, yields NaN for every row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Polynomial degree applied to each feature.
    #[serde(default = "default_degree")]
    pub degree: usize,
    /// Whether to fit an intercept term.
    #[serde(default = "default_fit_intercept")]
    pub fit_intercept: bool,
    /// Coefficients on the expanded features, feature-major: `[x0, x0^2, .., x1, x1^2, ..]`.
    #[serde(default)]
    pub coefficients: Vec<f64>,
    /// Intercept, zero when `fit_intercept` is false.
    #[serde(default)]
    pub intercept: f64,
    #[serde(default)]
    n_features: usize,
}

impl Default for LinearRegression {
    fn default() -> Self {
        LinearRegression::new(1, true)
    }
}

impl LinearRegression {
    /// Create an unfitted linear regressor.
    ///
    /// * `degree` - Polynomial degree applied to every feature, at least 1.
    /// * `fit_intercept` - Whether to fit an intercept term.
    pub fn new(degree: usize, fit_intercept: bool) -> Self {
        LinearRegression {
            degree,
            fit_intercept,
            coefficients: Vec::new(),
            intercept: 0.0,
            n_features: 0,
        }
    }

    /// Whether `fit` has completed successfully.
    pub fn is_fitted(&self) -> bool {
        self.n_features > 0
    }

    fn expand(&self, data: &Matrix<f64>) -> Vec<Vec<f64>> {
        let mut columns = Vec::with_capacity(data.cols * self.degree);
        for col in 0..data.cols {
            let values = data.get_col(col);
            for d in 1..=self.degree {
                columns.push(values.iter().map(|v| v.powi(d as i32)).collect());
            }
        }
        columns
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, data: &Matrix<f64>, y: &[f64]) -> Result<(), MapieError> {
        if self.degree == 0 {
            return Err(MapieError::Configuration(
                "degree".to_string(),
                "an integer of at least 1".to_string(),
                "0".to_string(),
            ));
        }
        if data.rows == 0 || data.cols == 0 {
            return Err(MapieError::RegressorFailure(format!(
                "cannot fit on a {}x{} design",
                data.rows, data.cols
            )));
        }
        if y.len() != data.rows {
            return Err(MapieError::RegressorFailure(format!(
                "{} targets for {} rows",
                y.len(),
                data.rows
            )));
        }
        let n = data.rows as f64;
        let mut columns = self.expand(data);

        let mut offsets = vec![0.0; columns.len()];
        let mut scales = vec![1.0; columns.len()];
        for (j, column) in columns.iter_mut().enumerate() {
            let offset = if self.fit_intercept {
                column.iter().sum::<f64>() / n
            } else {
                0.0
            };
            let spread = (column.iter().map(|v| (v - offset).powi(2)).sum::<f64>() / n).sqrt();
            let scale = if spread > f64::MIN_POSITIVE { spread } else { 1.0 };
            column.iter_mut().for_each(|v| *v = (*v - offset) / scale);
            offsets[j] = offset;
            scales[j] = scale;
        }

        let y_offset = if self.fit_intercept { y.iter().sum::<f64>() / n } else { 0.0 };
        let target: Vec<f64> = y.iter().map(|v| v - y_offset).collect();

        let solution = least_squares_qr(columns, target);

        self.coefficients = solution.iter().zip(&scales).map(|(b, s)| b / s).collect();
        self.intercept = if self.fit_intercept {
            y_offset
                - self
                    .coefficients
                    .iter()
                    .zip(&offsets)
                    .map(|(c, o)| c * o)
                    .sum::<f64>()
        } else {
            0.0
        };
        self.n_features = data.cols;
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            self.n_features = 0;
            return Err(MapieError::RegressorFailure(
                "least squares solution is not finite".to_string(),
            ));
        }
        Ok(())
    }

    fn predict(&self, data: &Matrix<f64>) -> Vec<f64> {
        if !self.is_fitted() || data.cols != self.n_features {
            return vec![f64::NAN; data.rows];
        }
        let mut preds = vec![self.intercept; data.rows];
        for col in 0..data.cols {
            let values = data.get_col(col);
            for d in 1..=self.degree {
                let coef = self.coefficients[col * self.degree + d - 1];
                preds
                    .iter_mut()
                    .zip(values)
                    .for_each(|(p, v)| *p += coef * v.powi(d as i32));
            }
        }
        preds
    }
}

/// Solve `min ||A b - y||` with Householder reflections.
///
/// A column whose remaining part is below the rank tolerance is skipped and keeps a zero
/// coefficient. Rows are only consumed by accepted columns, so the `r`-th reflection acts on
/// rows `r..` whatever columns were skipped before it.
///
/// * `columns` - The design matrix, one vector per column, all of length `m`.
/// * `y` - Right hand side of length `m`.
fn least_squares_qr(mut columns: Vec<Vec<f64>>, mut y: Vec<f64>) -> Vec<f64> {
    let m = y.len();
    let p = columns.len();
    let max_norm = columns
        .iter()
        .map(|c| c.iter().map(|v| v * v).sum::<f64>().sqrt())
        .fold(0.0, f64::max);
    let tol = RANK_TOLERANCE * max_norm.max(1.0);

    // (column, diagonal of R), the i-th entry pivots on row i.
    let mut pivots: Vec<(usize, f64)> = Vec::with_capacity(m.min(p));
    for k in 0..p {
        let r = pivots.len();
        if r == m {
            break;
        }
        let norm = columns[k][r..].iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm <= tol {
            continue;
        }
        let alpha = if columns[k][r] > 0.0 { -norm } else { norm };
        let mut v: Vec<f64> = columns[k][r..].to_vec();
        v[0] -= alpha;
        let v_norm2 = v.iter().map(|x| x * x).sum::<f64>();
        if v_norm2 > f64::MIN_POSITIVE {
            for column in columns.iter_mut().skip(k + 1) {
                reflect(&v, v_norm2, &mut column[r..]);
            }
            reflect(&v, v_norm2, &mut y[r..]);
        }
        pivots.push((k, alpha));
    }

    // Back substitution over the accepted (row, column) pairs.
    let mut solution = vec![0.0; p];
    for (row, &(k, diag)) in pivots.iter().enumerate().rev() {
        let mut acc = y[row];
        for &(j, _) in &pivots[row + 1..] {
            acc -= columns[j][row] * solution[j];
        }
        solution[k] = acc / diag;
    }
    solution
}

#[inline]
fn reflect(v: &[f64], v_norm2: f64, target: &mut [f64]) {
    let dot = v.iter().zip(target.iter()).map(|(a, b)| a * b).sum::<f64>();
    let factor = 2.0 * dot / v_norm2;
    target.iter_mut().zip(v).for_each(|(t, a)| *t -= factor * a);
}
