use crate::conformal::method::{Method, PointPrediction};
use crate::conformal::MapieRegressor;
use crate::regressor::Regressor;

impl<R: Regressor> MapieRegressor<R> {
    // Set methods for parameters. They take effect at the next call to `fit`,
    // except `alpha`, which `predict` reads directly.

    /// Set the interval estimation method.
    /// * `method` - One of the seven resampling methods.
    pub fn set_method(mut self, method: Method) -> Self {
        self.cfg.method = method;
        self
    }

    /// Set the miscoverage level.
    /// * `alpha` - Target probability of the true value falling outside the interval,
    ///   strictly between 0 and 1.
    pub fn set_alpha(mut self, alpha: f64) -> Self {
        self.cfg.alpha = alpha;
        self
    }

    /// Set the number of folds for the CV methods.
    /// * `n_splits` - Number of folds, at least 2 and at most the number of samples.
    pub fn set_n_splits(mut self, n_splits: usize) -> Self {
        self.cfg.n_splits = n_splits;
        self
    }

    /// Set whether samples are permuted before fold assignment.
    /// * `shuffle` - Permute with a generator seeded from `seed`.
    pub fn set_shuffle(mut self, shuffle: bool) -> Self {
        self.cfg.shuffle = shuffle;
        self
    }

    /// Set the seed used for the fold permutation.
    /// * `seed` - Integer value used to seed any randomness used in the algorithm.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.cfg.seed = seed;
        self
    }

    /// Set the point prediction strategy of the "+" and minmax methods.
    /// * `point_prediction` - Full-data model, or median or mean of the split predictions.
    pub fn set_point_prediction(mut self, point_prediction: PointPrediction) -> Self {
        self.cfg.point_prediction = point_prediction;
        self
    }

    /// Set the number of threads used to fit split models.
    /// * `num_threads` - Thread count, `None` for all available cores.
    pub fn set_num_threads(mut self, num_threads: Option<usize>) -> Self {
        self.cfg.num_threads = num_threads;
        self
    }
}
