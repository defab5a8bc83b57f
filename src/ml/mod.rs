//! Donation prediction models
//!
//! A donor record is encoded by [`FeatureSchema`] into the column layout the
//! regressors were fit on. Two regressors (amount, days until next donation)
//! share that schema and are persisted together by [`ModelStore`].

pub mod errors;
pub mod features;
pub mod model;
pub mod regressor;
pub mod store;

pub use errors::{MlError, MlResult};
pub use features::FeatureSchema;
pub use model::{ModelPair, Prediction, TrainingMetrics, TrainingParams};
pub use regressor::{GradientBoostedRegressor, Regressor};
pub use store::ModelStore;

/// Mean absolute error between targets and predictions
pub fn mean_absolute_error(targets: &[f32], predictions: &[f32]) -> f64 {
    if targets.is_empty() {
        return 0.0;
    }
    let total: f64 = targets
        .iter()
        .zip(predictions)
        .map(|(t, p)| (*t as f64 - *p as f64).abs())
        .sum();
    total / targets.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_absolute_error() {
        assert_eq!(mean_absolute_error(&[1.0, 2.0, 3.0], &[2.0, 2.0, 1.0]), 1.0);
        assert_eq!(mean_absolute_error(&[], &[]), 0.0);
    }
}
