use gbdt::config::Config as GbdtConfig;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};

use super::{MlError, MlResult};

/// A model mapping a feature vector to one continuous value
pub trait Regressor {
    fn fit(&mut self, features: &[Vec<f32>], targets: &[f32]) -> MlResult<()>;

    fn predict(&self, features: &[f32]) -> MlResult<f32>;

    fn predict_batch(&self, rows: &[Vec<f32>]) -> MlResult<Vec<f32>> {
        rows.iter().map(|row| self.predict(row)).collect()
    }
}

/// Gradient boosted regression trees with squared-error loss
#[derive(Serialize, Deserialize)]
pub struct GradientBoostedRegressor {
    feature_size: usize,
    #[serde(default)]
    fitted: bool,
    model: GBDT,
}

impl GradientBoostedRegressor {
    pub fn new(feature_size: usize, iterations: usize, max_depth: u32, shrinkage: f32) -> Self {
        let mut cfg = GbdtConfig::new();
        cfg.set_feature_size(feature_size);
        cfg.set_max_depth(max_depth);
        cfg.set_iterations(iterations);
        cfg.set_shrinkage(shrinkage);
        cfg.set_loss("SquaredError");
        cfg.set_debug(false);

        Self {
            feature_size,
            fitted: false,
            model: GBDT::new(&cfg),
        }
    }

    fn check_width(&self, row: &[f32]) -> MlResult<()> {
        if row.len() != self.feature_size {
            return Err(MlError::SchemaMismatch {
                expected: self.feature_size,
                actual: row.len(),
            });
        }
        Ok(())
    }
}

impl Regressor for GradientBoostedRegressor {
    fn fit(&mut self, features: &[Vec<f32>], targets: &[f32]) -> MlResult<()> {
        if features.is_empty() {
            return Err(MlError::EmptyDataset);
        }
        for row in features {
            self.check_width(row)?;
        }

        let mut data: DataVec = features
            .iter()
            .zip(targets)
            .map(|(row, target)| Data::new_training_data(row.clone(), 1.0, *target, None))
            .collect();

        self.model.fit(&mut data);
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, features: &[f32]) -> MlResult<f32> {
        self.predict_batch(&[features.to_vec()])?
            .into_iter()
            .next()
            .ok_or_else(|| MlError::InvalidPrediction("regressor returned no value".to_string()))
    }

    fn predict_batch(&self, rows: &[Vec<f32>]) -> MlResult<Vec<f32>> {
        if !self.fitted {
            return Err(MlError::NotFitted);
        }
        for row in rows {
            self.check_width(row)?;
        }
        let data: DataVec = rows
            .iter()
            .map(|row| Data::new_test_data(row.clone(), None))
            .collect();
        Ok(self.model.predict(&data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_step_function() {
        let features: Vec<Vec<f32>> = (0..40).map(|i| vec![i as f32, 1.0]).collect();
        let targets: Vec<f32> = (0..40).map(|i| if i < 20 { 10.0 } else { 100.0 }).collect();

        let mut reg = GradientBoostedRegressor::new(2, 50, 3, 0.3);
        reg.fit(&features, &targets).unwrap();

        let low = reg.predict(&[5.0, 1.0]).unwrap();
        let high = reg.predict(&[35.0, 1.0]).unwrap();
        assert!(low < 40.0, "low side predicted {}", low);
        assert!(high > 70.0, "high side predicted {}", high);
    }

    #[test]
    fn test_rejects_wrong_width() {
        let mut reg = GradientBoostedRegressor::new(3, 5, 2, 0.1);
        reg.fit(&[vec![1.0, 2.0, 3.0], vec![2.0, 3.0, 4.0]], &[1.0, 2.0]).unwrap();
        match reg.predict(&[1.0, 2.0]) {
            Err(MlError::SchemaMismatch { expected, actual }) => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("expected SchemaMismatch, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_unfitted_predict_is_an_error() {
        let reg = GradientBoostedRegressor::new(2, 5, 2, 0.1);
        assert!(matches!(reg.predict(&[1.0, 2.0]), Err(MlError::NotFitted)));
    }

    #[test]
    fn test_empty_fit_is_an_error() {
        let mut reg = GradientBoostedRegressor::new(1, 5, 2, 0.1);
        assert!(matches!(reg.fit(&[], &[]), Err(MlError::EmptyDataset)));
    }
}
