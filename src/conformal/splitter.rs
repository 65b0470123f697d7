//! Splitter
//!
//! Strategies for partitioning training indices into held-out groups, so that every
//! training point gets a residual from a model that never saw it.
use crate::errors::MapieError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// A partition of `0..n_samples` into disjoint, non-empty held-out groups.
#[derive(Debug, Clone, PartialEq)]
pub struct Folds {
    groups: Vec<Vec<usize>>,
    assignment: Vec<usize>,
}

impl Folds {
    /// Build folds from explicit groups, checking that they partition `0..n_samples`.
    ///
    /// * `groups` - Held-out indices of each split.
    /// * `n_samples` - Number of training points.
    pub fn new(groups: Vec<Vec<usize>>, n_samples: usize) -> Result<Self, MapieError> {
        let mut assignment = vec![usize::MAX; n_samples];
        for (k, group) in groups.iter().enumerate() {
            if group.is_empty() {
                return Err(MapieError::Configuration(
                    "n_splits".to_string(),
                    "non-empty folds".to_string(),
                    format!("an empty fold {}", k),
                ));
            }
            for &i in group {
                if i >= n_samples || assignment[i] != usize::MAX {
                    return Err(MapieError::Validation(format!(
                        "index {} is out of range or held out twice",
                        i
                    )));
                }
                assignment[i] = k;
            }
        }
        if let Some(i) = assignment.iter().position(|k| *k == usize::MAX) {
            return Err(MapieError::Validation(format!("index {} is never held out", i)));
        }
        Ok(Folds { groups, assignment })
    }

    pub fn n_folds(&self) -> usize {
        self.groups.len()
    }

    pub fn n_samples(&self) -> usize {
        self.assignment.len()
    }

    /// Indices held out by split `k`.
    pub fn held_out(&self, k: usize) -> &[usize] {
        &self.groups[k]
    }

    /// Indices used to train split `k`, in ascending order.
    pub fn train(&self, k: usize) -> Vec<usize> {
        (0..self.n_samples()).filter(|i| self.assignment[*i] != k).collect()
    }

    /// For each training point, the split that held it out.
    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }
}

/// A splitter assigns every training index to the split that holds it out.
pub trait Splitter {
    /// Partition `0..n_samples`. Randomness, if any, is drawn from `rng`.
    fn split(&self, rng: &mut StdRng, n_samples: usize) -> Result<Folds, MapieError>;
}

/// One split per training point.
pub struct LeaveOneOut;

impl Splitter for LeaveOneOut {
    fn split(&self, _rng: &mut StdRng, n_samples: usize) -> Result<Folds, MapieError> {
        if n_samples < 2 {
            return Err(MapieError::Configuration(
                "n_samples".to_string(),
                "at least 2 samples for leave-one-out".to_string(),
                n_samples.to_string(),
            ));
        }
        Folds::new((0..n_samples).map(|i| vec![i]).collect(), n_samples)
    }
}

/// Contiguous k-fold partition over the (optionally shuffled) index order.
/// Fold sizes differ by at most one, earlier folds take the extra points.
pub struct KFold {
    n_splits: usize,
    shuffle: bool,
}

impl KFold {
    pub fn new(n_splits: usize, shuffle: bool) -> Self {
        KFold { n_splits, shuffle }
    }
}

impl Splitter for KFold {
    fn split(&self, rng: &mut StdRng, n_samples: usize) -> Result<Folds, MapieError> {
        if self.n_splits < 2 {
            return Err(MapieError::Configuration(
                "n_splits".to_string(),
                "an integer of at least 2".to_string(),
                self.n_splits.to_string(),
            ));
        }
        if self.n_splits > n_samples {
            return Err(MapieError::Configuration(
                "n_splits".to_string(),
                format!("at most the number of samples ({})", n_samples),
                self.n_splits.to_string(),
            ));
        }
        let mut order: Vec<usize> = (0..n_samples).collect();
        if self.shuffle {
            order.shuffle(rng);
        }
        let base = n_samples / self.n_splits;
        let extra = n_samples % self.n_splits;
        let mut groups = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for k in 0..self.n_splits {
            let size = base + usize::from(k < extra);
            groups.push(order[start..start + size].to_vec());
            start += size;
        }
        Folds::new(groups, n_samples)
    }
}
