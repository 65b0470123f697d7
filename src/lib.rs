// Modules
pub mod conformal;
pub mod data;
pub mod errors;
pub mod metrics;
pub mod regressor;
pub mod utils;

// Individual classes, and functions
pub use conformal::{MapieConfig, MapieRegressor, Method, ModelIO, PointPrediction, PredictionInterval};
pub use data::Matrix;
pub use errors::MapieError;
pub use regressor::{LinearRegression, Regressor};
