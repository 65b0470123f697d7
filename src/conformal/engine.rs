//! Resampling Engine
//!
//! Fits one regressor per split and records, for every training point, the absolute
//! residual of the model that held it out.
use crate::conformal::splitter::Folds;
use crate::data::Matrix;
use crate::errors::MapieError;
use crate::regressor::Regressor;
use log::debug;
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};

/// Residuals and, optionally, the per-split models that produced them.
///
/// Models live in an index arena: `split_of[i]` is the position in `models` of the
/// model that never saw training point `i`. `models` is empty when they were not retained.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResamplingState<R> {
    /// Absolute out-of-split residual per training point.
    pub residuals: Vec<f64>,
    /// Split that held out each training point.
    pub split_of: Vec<usize>,
    /// Fitted per-split models, indexed by split.
    pub models: Vec<R>,
    /// Number of splits that were fit.
    pub n_splits: usize,
}

/// Fit the template on the full training set.
pub fn fit_full<R: Regressor>(template: &R, data: &Matrix<f64>, y: &[f64]) -> Result<R, MapieError> {
    let mut model = template.clone();
    model.fit(data, y)?;
    Ok(model)
}

/// Residuals of a model measured on its own training data.
pub fn in_sample<R: Regressor>(model: &R, data: &Matrix<f64>, y: &[f64]) -> Result<ResamplingState<R>, MapieError> {
    let preds = model.predict(data);
    let rows: Vec<usize> = (0..data.rows).collect();
    let residuals = residuals_for(0, &rows, &preds, y)?;
    Ok(ResamplingState {
        residuals,
        split_of: vec![0; y.len()],
        models: Vec::new(),
        n_splits: 0,
    })
}

/// Fit one model per split on the given pool.
///
/// Splits are independent: every worker clones the template, trains on the complement
/// of its fold and predicts its held-out points. Results are gathered in split order.
///
/// * `template` - Unfitted regressor cloned for every split.
/// * `folds` - Partition of the training indices.
/// * `retain_models` - Keep the fitted models for prediction time.
/// * `pool` - Thread pool the splits run on.
pub fn fit_splits<R: Regressor>(
    template: &R,
    data: &Matrix<f64>,
    y: &[f64],
    folds: &Folds,
    retain_models: bool,
    pool: &ThreadPool,
) -> Result<ResamplingState<R>, MapieError> {
    let results: Vec<Result<(R, Vec<f64>), MapieError>> = pool.install(|| {
        (0..folds.n_folds())
            .into_par_iter()
            .map(|k| fit_split(template, data, y, folds, k))
            .collect()
    });

    let mut residuals = vec![f64::NAN; y.len()];
    let mut models = Vec::with_capacity(if retain_models { folds.n_folds() } else { 0 });
    for (k, result) in results.into_iter().enumerate() {
        let (model, split_residuals) = result?;
        for (i, r) in folds.held_out(k).iter().zip(split_residuals) {
            residuals[*i] = r;
        }
        if retain_models {
            models.push(model);
        }
    }

    Ok(ResamplingState {
        residuals,
        split_of: folds.assignment().to_vec(),
        models,
        n_splits: folds.n_folds(),
    })
}

fn fit_split<R: Regressor>(
    template: &R,
    data: &Matrix<f64>,
    y: &[f64],
    folds: &Folds,
    k: usize,
) -> Result<(R, Vec<f64>), MapieError> {
    let train = folds.train(k);
    if train.is_empty() {
        return Err(MapieError::DegenerateSplit(k, "no training rows left".to_string()));
    }
    let train_buf = data.select_rows(&train);
    let x_train = Matrix::new(&train_buf, train.len(), data.cols);
    let y_train: Vec<f64> = train.iter().map(|i| y[*i]).collect();
    let mut model = template.clone();
    model.fit(&x_train, &y_train)?;

    let held_out = folds.held_out(k);
    let held_buf = data.select_rows(held_out);
    let x_held = Matrix::new(&held_buf, held_out.len(), data.cols);
    let preds = model.predict(&x_held);
    let residuals = residuals_for(k, held_out, &preds, y)?;
    debug!(
        "Split {} trained on {} rows, held out {} rows.",
        k,
        train.len(),
        held_out.len()
    );
    Ok((model, residuals))
}

fn residuals_for(split: usize, held_out: &[usize], preds: &[f64], y: &[f64]) -> Result<Vec<f64>, MapieError> {
    if preds.len() != held_out.len() {
        return Err(MapieError::DegenerateSplit(
            split,
            format!("{} predictions for {} held-out rows", preds.len(), held_out.len()),
        ));
    }
    held_out
        .iter()
        .zip(preds)
        .map(|(i, p)| {
            let r = (y[*i] - p).abs();
            if r.is_finite() {
                Ok(r)
            } else {
                Err(MapieError::DegenerateSplit(
                    split,
                    format!("non-finite residual for training row {}", i),
                ))
            }
        })
        .collect()
}
