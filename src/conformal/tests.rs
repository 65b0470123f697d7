use crate::conformal::{MapieConfig, MapieRegressor, Method, ModelIO, PointPrediction, PredictionInterval};
use crate::errors::MapieError;
use crate::metrics::{coverage_score, mean_width};
use crate::regressor::{LinearRegression, Regressor};
use crate::Matrix;
use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use tempfile::tempdir;

#[derive(Clone, Default)]
struct MeanRegressor {
    mean: f64,
}

impl Regressor for MeanRegressor {
    fn fit(&mut self, _data: &Matrix<f64>, y: &[f64]) -> Result<(), MapieError> {
        self.mean = y.iter().sum::<f64>() / y.len() as f64;
        Ok(())
    }
    fn predict(&self, data: &Matrix<f64>) -> Vec<f64> {
        vec![self.mean; data.rows]
    }
}

fn x_sin_x(x: f64) -> f64 {
    x * x.sin()
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + (end - start) * i as f64 / (n - 1) as f64).collect()
}

fn noisy(rng: &mut StdRng, x: &[f64], f: fn(f64) -> f64, sigma: f64) -> Vec<f64> {
    let noise = Normal::new(0.0, sigma).unwrap();
    x.iter().map(|v| f(*v) + rng.sample(noise)).collect()
}

fn widths(intervals: &[PredictionInterval]) -> Vec<f64> {
    intervals.iter().map(|i| i.width()).collect()
}

fn fit_predict(method: Method, alpha: f64, x: &[f64], y: &[f64], x_test: &[f64]) -> Vec<PredictionInterval> {
    let mut mapie = MapieRegressor::new(LinearRegression::new(3, true))
        .set_method(method)
        .set_alpha(alpha)
        .set_n_splits(5)
        .set_shuffle(true)
        .set_seed(11);
    mapie.fit(&Matrix::new(x, x.len(), 1), y).unwrap();
    mapie.predict(&Matrix::new(x_test, x_test.len(), 1), false).unwrap()
}

#[test]
fn test_every_method_returns_ordered_rows() {
    let mut rng = StdRng::seed_from_u64(0);
    let x = linspace(-3.0, 3.0, 60);
    let y = noisy(&mut rng, &x, x_sin_x, 0.3);
    let x_test = linspace(-2.5, 2.5, 37);

    for method in Method::ALL {
        let intervals = fit_predict(method, 0.1, &x, &y, &x_test);
        assert_eq!(intervals.len(), x_test.len(), "{}", method);
        for interval in &intervals {
            assert!(interval.is_ordered(), "{} produced {:?}", method, interval);
            assert!(interval.width().is_finite());
        }
    }
}

#[test]
fn test_naive_exact() {
    let x = vec![0.0, 1.0, 2.0, 3.0];
    let y = vec![1.0, 2.0, 3.0, 6.0];
    let data = Matrix::new(&x, 4, 1);
    let mut mapie = MapieRegressor::new(MeanRegressor::default())
        .set_method(Method::Naive)
        .set_alpha(0.5);
    mapie.fit(&data, &y).unwrap();
    // In-sample residuals around the mean 3 are [2, 1, 0, 3], their median is 1.5.
    let intervals = mapie.predict(&data, false).unwrap();
    for interval in intervals {
        assert_relative_eq!(interval.point, 3.0);
        assert_relative_eq!(interval.lower, 1.5);
        assert_relative_eq!(interval.upper, 4.5);
    }
    assert_eq!(mapie.n_splits_fitted(), Some(0));
}

#[test]
fn test_jackknife_family_exact() {
    let x = vec![0.0, 1.0, 2.0, 3.0];
    let y = vec![1.0, 2.0, 3.0, 6.0];
    let data = Matrix::new(&x, 4, 1);
    let query = vec![10.0];
    let query = Matrix::new(&query, 1, 1);

    // Leave-one-out means are [11/3, 10/3, 3, 2], residuals [8/3, 4/3, 0, 4].
    let mut plus = MapieRegressor::new(MeanRegressor::default())
        .set_method(Method::JackknifePlus)
        .set_alpha(0.5);
    plus.fit(&data, &y).unwrap();
    assert_eq!(plus.split_models().map(|m| m.len()), Some(4));
    let interval = plus.predict(&query, false).unwrap()[0];
    assert_relative_eq!(interval.point, 19.0 / 6.0, epsilon = 1e-12);
    assert_relative_eq!(interval.lower, 1.5, epsilon = 1e-12);
    assert_relative_eq!(interval.upper, 16.0 / 3.0, epsilon = 1e-12);

    let mut minmax = MapieRegressor::new(MeanRegressor::default())
        .set_method(Method::JackknifeMinmax)
        .set_alpha(0.5);
    minmax.fit(&data, &y).unwrap();
    let interval = minmax.predict(&query, false).unwrap()[0];
    assert_relative_eq!(interval.lower, -2.0, epsilon = 1e-12);
    assert_relative_eq!(interval.upper, 19.0 / 3.0, epsilon = 1e-12);

    let mut jackknife = MapieRegressor::new(MeanRegressor::default())
        .set_method(Method::Jackknife)
        .set_alpha(0.5);
    jackknife.fit(&data, &y).unwrap();
    assert!(jackknife.split_models().unwrap().is_empty());
    let interval = jackknife.predict(&query, false).unwrap()[0];
    // Median of the sorted residuals [0, 4/3, 8/3, 4] is 2.
    assert_relative_eq!(interval.point, 3.0);
    assert_relative_eq!(interval.width(), 4.0, epsilon = 1e-12);
}

#[test]
fn test_single_and_mean_point_predictions() {
    let x = vec![0.0, 1.0, 2.0, 3.0];
    let y = vec![1.0, 2.0, 3.0, 6.0];
    let data = Matrix::new(&x, 4, 1);

    let mut single = MapieRegressor::new(MeanRegressor::default())
        .set_method(Method::JackknifePlus)
        .set_point_prediction(PointPrediction::Single);
    single.fit(&data, &y).unwrap();
    assert!(single.full_model().is_some());
    assert_relative_eq!(single.predict(&data, false).unwrap()[0].point, 3.0);

    let mut mean = MapieRegressor::new(MeanRegressor::default())
        .set_method(Method::JackknifePlus)
        .set_point_prediction(PointPrediction::Mean);
    mean.fit(&data, &y).unwrap();
    assert!(mean.full_model().is_none());
    // Mean of the leave-one-out means is the full mean.
    assert_relative_eq!(mean.predict(&data, false).unwrap()[0].point, 3.0, epsilon = 1e-12);
}

#[test]
fn test_deterministic_for_fixed_seed() {
    let mut rng = StdRng::seed_from_u64(5);
    let x = linspace(0.0, 4.0, 45);
    let y = noisy(&mut rng, &x, x_sin_x, 0.2);
    let data = Matrix::new(&x, x.len(), 1);

    let run = |threads: usize, parallel: bool| {
        let mut mapie = MapieRegressor::new(LinearRegression::new(2, true))
            .set_method(Method::CvPlus)
            .set_n_splits(4)
            .set_shuffle(true)
            .set_seed(99)
            .set_num_threads(Some(threads));
        mapie.fit(&data, &y).unwrap();
        mapie.predict(&data, parallel).unwrap()
    };
    let first = run(1, false);
    assert_eq!(first, run(1, false));
    assert_eq!(first, run(4, true));
}

#[test]
fn test_width_non_decreasing_as_alpha_decreases() {
    let mut rng = StdRng::seed_from_u64(1);
    let x = linspace(-3.0, 3.0, 40);
    let y = noisy(&mut rng, &x, x_sin_x, 0.5);
    let data = Matrix::new(&x, x.len(), 1);
    let x_test = linspace(-3.0, 3.0, 25);
    let query = Matrix::new(&x_test, x_test.len(), 1);
    let alphas = [0.5, 0.3, 0.2, 0.1, 0.05, 0.01];

    for method in Method::ALL {
        let mut mapie = MapieRegressor::new(LinearRegression::new(3, true))
            .set_method(method)
            .set_n_splits(5);
        mapie.fit(&data, &y).unwrap();
        let mut previous = vec![0.0; x_test.len()];
        for alpha in alphas {
            let current = widths(&mapie.predict_with_alpha(&query, alpha, false).unwrap());
            for (c, p) in current.iter().zip(&previous) {
                assert!(*c >= p - 1e-12, "{} narrowed at alpha {}", method, alpha);
            }
            previous = current;
        }
    }
}

#[test]
fn test_minmax_at_least_as_wide_as_plus() {
    let mut rng = StdRng::seed_from_u64(2);
    let x = linspace(-4.0, 4.0, 50);
    let y = noisy(&mut rng, &x, x_sin_x, 0.4);
    let x_test = linspace(-5.0, 5.0, 30);

    for (plus, minmax) in [(Method::JackknifePlus, Method::JackknifeMinmax), (Method::CvPlus, Method::CvMinmax)] {
        for alpha in [0.05, 0.2] {
            let narrow = widths(&fit_predict(plus, alpha, &x, &y, &x_test));
            let wide = widths(&fit_predict(minmax, alpha, &x, &y, &x_test));
            for (w, n) in wide.iter().zip(&narrow) {
                assert!(*w >= n - 1e-12, "{} narrower than {}", minmax, plus);
            }
        }
    }
}

#[test]
fn test_coverage_sanity() {
    let mut rng = StdRng::seed_from_u64(2024);
    let line = |x: f64| 1.0 + 2.0 * x;
    let alpha = 0.05;
    let n_trials = 100;

    for method in [Method::JackknifePlus, Method::CvPlus] {
        let mut coverages = Vec::with_capacity(n_trials);
        for _ in 0..n_trials {
            let x: Vec<f64> = (0..40).map(|_| rng.gen_range(0.0..5.0)).collect();
            let y = noisy(&mut rng, &x, line, 1.0);
            let x_test: Vec<f64> = (0..100).map(|_| rng.gen_range(0.0..5.0)).collect();
            let y_test = noisy(&mut rng, &x_test, line, 1.0);

            let mut mapie = MapieRegressor::new(LinearRegression::default())
                .set_method(method)
                .set_alpha(alpha)
                .set_n_splits(5)
                .set_num_threads(Some(1));
            mapie.fit(&Matrix::new(&x, x.len(), 1), &y).unwrap();
            let intervals = mapie.predict(&Matrix::new(&x_test, x_test.len(), 1), false).unwrap();
            coverages.push(coverage_score(&y_test, &intervals));
        }
        let coverage = coverages.iter().sum::<f64>() / n_trials as f64;
        assert!((0.85..=1.0).contains(&coverage), "{} coverage {}", method, coverage);
    }
}

#[test]
fn test_x_sin_x_jackknife_plus_scenario() {
    // Width and coverage vary with the noise draw (about 1.8 to 2.4 and 0.90 to 0.98
    // across seeds). This seed lands on the typical width of 2.0 to 2.1 and coverage 0.95.
    let mut rng = StdRng::seed_from_u64(1);
    let x = linspace(-5.0, 5.0, 100);
    let y = noisy(&mut rng, &x, x_sin_x, 0.5);
    let x_test = linspace(-5.0, 5.0, 500);
    let y_test = noisy(&mut rng, &x_test, x_sin_x, 0.5);

    let cfg = MapieConfig {
        method: Method::JackknifePlus,
        alpha: 0.05,
        n_splits: 5,
        ..Default::default()
    };
    let mut mapie = MapieRegressor::with_config(LinearRegression::new(10, true), cfg);
    mapie.fit(&Matrix::new(&x, x.len(), 1), &y).unwrap();
    let intervals = mapie.predict(&Matrix::new(&x_test, x_test.len(), 1), true).unwrap();

    let width = mean_width(&intervals);
    let coverage = coverage_score(&y_test, &intervals);
    assert_relative_eq!(width, 2.104, epsilon = 2e-3);
    assert_relative_eq!(coverage, 0.956, epsilon = 1e-3);
}

#[test]
fn test_configuration_errors() {
    let x = linspace(0.0, 1.0, 10);
    let y = x.clone();
    let data = Matrix::new(&x, 10, 1);

    for method in [Method::Cv, Method::CvPlus, Method::CvMinmax] {
        let mut mapie = MapieRegressor::new(LinearRegression::default())
            .set_method(method)
            .set_n_splits(1);
        assert!(matches!(mapie.fit(&data, &y), Err(MapieError::Configuration(..))));
    }

    let mut too_many_folds = MapieRegressor::new(LinearRegression::default())
        .set_method(Method::Cv)
        .set_n_splits(11);
    assert!(matches!(too_many_folds.fit(&data, &y), Err(MapieError::Configuration(..))));

    let mut zero_folds = MapieRegressor::new(LinearRegression::default())
        .set_method(Method::CvPlus)
        .set_n_splits(0);
    assert!(matches!(zero_folds.fit(&data, &y), Err(MapieError::Validation(_))));

    let one = [1.0];
    for method in [Method::Jackknife, Method::JackknifePlus, Method::JackknifeMinmax] {
        let mut mapie = MapieRegressor::new(MeanRegressor::default()).set_method(method);
        assert!(matches!(
            mapie.fit(&Matrix::new(&one, 1, 1), &one),
            Err(MapieError::Configuration(..))
        ));
        assert!(!mapie.is_fitted());
    }

    let mut bad_alpha = MapieRegressor::new(LinearRegression::default()).set_alpha(0.0);
    assert!(matches!(bad_alpha.fit(&data, &y), Err(MapieError::Configuration(..))));
}

#[test]
fn test_validation_and_not_fitted_errors() {
    let x = linspace(0.0, 1.0, 10);
    let y = x.clone();
    let data = Matrix::new(&x, 10, 1);
    let mut mapie = MapieRegressor::new(LinearRegression::default()).set_method(Method::CvPlus).set_n_splits(2);

    assert!(matches!(mapie.predict(&data, false), Err(MapieError::NotFitted)));
    assert!(matches!(mapie.fit(&data, &y[..9]), Err(MapieError::Validation(_))));

    let mut nan_y = y.clone();
    nan_y[4] = f64::NAN;
    assert!(matches!(mapie.fit(&data, &nan_y), Err(MapieError::Validation(_))));

    let mut inf_x = x.clone();
    inf_x[2] = f64::INFINITY;
    assert!(matches!(
        mapie.fit(&Matrix::new(&inf_x, 10, 1), &y),
        Err(MapieError::Validation(_))
    ));

    mapie.fit(&data, &y).unwrap();
    let two_cols = vec![0.0; 8];
    assert!(matches!(
        mapie.predict(&Matrix::new(&two_cols, 4, 2), false),
        Err(MapieError::Validation(_))
    ));
    assert!(matches!(
        mapie.predict_with_alpha(&data, 1.5, false),
        Err(MapieError::Configuration(..))
    ));
    let empty: Vec<f64> = Vec::new();
    assert!(mapie.predict(&Matrix::new(&empty, 0, 1), false).unwrap().is_empty());

    // A failed refit leaves the estimator unfitted.
    assert!(mapie.fit(&data, &nan_y).is_err());
    assert!(matches!(mapie.predict(&data, false), Err(MapieError::NotFitted)));
}

#[test]
fn test_predict_uses_fitted_method() {
    let mut rng = StdRng::seed_from_u64(8);
    let x = linspace(0.0, 2.0, 20);
    let y = noisy(&mut rng, &x, x_sin_x, 0.1);
    let data = Matrix::new(&x, x.len(), 1);

    let mut mapie = MapieRegressor::new(LinearRegression::default())
        .set_method(Method::Cv)
        .set_n_splits(4);
    mapie.fit(&data, &y).unwrap();
    let before = mapie.predict(&data, false).unwrap();
    mapie.cfg.method = Method::CvMinmax;
    mapie.cfg.point_prediction = PointPrediction::Single;
    assert_eq!(before, mapie.predict(&data, false).unwrap());
}

#[test]
fn test_fitted_estimator_persistence() {
    let mut rng = StdRng::seed_from_u64(3);
    let x = linspace(-2.0, 2.0, 30);
    let y = noisy(&mut rng, &x, x_sin_x, 0.2);
    let data = Matrix::new(&x, x.len(), 1);

    let mut mapie = MapieRegressor::new(LinearRegression::new(3, true))
        .set_method(Method::CvMinmax)
        .set_n_splits(3);
    mapie.fit(&data, &y).unwrap();
    let preds = mapie.predict(&data, false).unwrap();

    let restored = MapieRegressor::<LinearRegression>::from_json(&mapie.json_dump().unwrap()).unwrap();
    assert_eq!(restored.predict(&data, false).unwrap(), preds);

    let dir = tempdir().unwrap();
    let path = dir.path().join("mapie.json");
    mapie.save(&path).unwrap();
    let loaded = MapieRegressor::<LinearRegression>::load(&path).unwrap();
    assert_eq!(loaded.residuals(), mapie.residuals());
    assert_eq!(loaded.predict(&data, false).unwrap(), preds);

    let unfitted = MapieRegressor::new(LinearRegression::default());
    let reloaded = MapieRegressor::<LinearRegression>::from_json(&unfitted.json_dump().unwrap()).unwrap();
    assert!(!reloaded.is_fitted());
}
