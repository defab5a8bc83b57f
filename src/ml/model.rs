use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::features::FeatureSchema;
use super::regressor::{GradientBoostedRegressor, Regressor};
use super::{mean_absolute_error, MlError, MlResult};
use crate::config::ModelConfig;
use crate::data::{DonorFeatures, TrainingRecord};

/// Hyperparameters shared by both regressors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingParams {
    pub iterations: usize,
    pub max_depth: u32,
    pub shrinkage: f32,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            iterations: 100,
            max_depth: 6,
            shrinkage: 0.1,
        }
    }
}

impl From<&ModelConfig> for TrainingParams {
    fn from(config: &ModelConfig) -> Self {
        Self {
            iterations: config.iterations,
            max_depth: config.max_depth,
            shrinkage: config.shrinkage,
        }
    }
}

/// In-sample error of a freshly trained pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub rows: usize,
    pub amount_mae: f64,
    pub days_mae: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub amount: f64,
    pub days_until_next: i64,
    pub next_donation_date: NaiveDate,
}

/// Amount and days-until-next-donation regressors fit on one schema
#[derive(Serialize, Deserialize)]
pub struct ModelPair {
    pub id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub schema: FeatureSchema,
    pub params: TrainingParams,
    pub metrics: TrainingMetrics,
    amount: GradientBoostedRegressor,
    days: GradientBoostedRegressor,
}

impl std::fmt::Debug for ModelPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelPair")
            .field("id", &self.id)
            .field("trained_at", &self.trained_at)
            .field("columns", &self.schema.columns())
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl ModelPair {
    /// Fit both regressors on `records`, measuring day offsets from `today`
    pub fn train(records: &[TrainingRecord], params: TrainingParams, today: NaiveDate) -> MlResult<Self> {
        if records.is_empty() {
            return Err(MlError::EmptyDataset);
        }

        let schema = FeatureSchema::fit(records.iter().map(|r| &r.features));
        let matrix: Vec<Vec<f32>> = records
            .iter()
            .map(|r| schema.encode(&r.features, today))
            .collect();
        let amount_targets: Vec<f32> = records.iter().map(|r| r.predicted_donation as f32).collect();
        let day_targets: Vec<f32> = records
            .iter()
            .map(|r| (r.next_donation_date - today).num_days() as f32)
            .collect();

        info!(
            rows = records.len(),
            columns = schema.width(),
            iterations = params.iterations,
            "Training donation models"
        );
        debug!(columns = ?schema.columns(), "Feature layout");

        let mut amount = regressor_for(&schema, params);
        amount.fit(&matrix, &amount_targets)?;

        let mut days = regressor_for(&schema, params);
        days.fit(&matrix, &day_targets)?;

        let metrics = TrainingMetrics {
            rows: records.len(),
            amount_mae: mean_absolute_error(&amount_targets, &amount.predict_batch(&matrix)?),
            days_mae: mean_absolute_error(&day_targets, &days.predict_batch(&matrix)?),
        };

        info!("Donation Model MAE: {:.4}", metrics.amount_mae);
        info!("Date Model MAE: {:.4}", metrics.days_mae);

        Ok(Self {
            id: Uuid::new_v4(),
            trained_at: Utc::now(),
            schema,
            params,
            metrics,
            amount,
            days,
        })
    }

    /// Predict the next donation amount and date for one donor
    pub fn predict(&self, features: &DonorFeatures, today: NaiveDate) -> MlResult<Prediction> {
        let row = self.schema.encode_for_inference(features, today);

        let amount = self.amount.predict(&row)? as f64;
        let raw_days = self.days.predict(&row)?;
        if !raw_days.is_finite() || !amount.is_finite() {
            return Err(MlError::InvalidPrediction(format!(
                "non-finite prediction (amount {}, days {})",
                amount, raw_days
            )));
        }
        // Truncate toward zero: 12.9 days is still 12 whole days away
        let days_until_next = raw_days.trunc() as i64;
        let next_donation_date = offset_date(today, days_until_next)?;

        debug!(model_id = %self.id, amount, days_until_next, "Prediction computed");

        Ok(Prediction {
            amount,
            days_until_next,
            next_donation_date,
        })
    }
}

/// `today` shifted by `days`, or an error when the result is not a date
pub fn offset_date(today: NaiveDate, days: i64) -> MlResult<NaiveDate> {
    Duration::try_days(days)
        .and_then(|offset| today.checked_add_signed(offset))
        .ok_or_else(|| MlError::InvalidPrediction(format!("{} days from {} is not a valid date", days, today)))
}

fn regressor_for(schema: &FeatureSchema, params: TrainingParams) -> GradientBoostedRegressor {
    GradientBoostedRegressor::new(schema.width(), params.iterations, params.max_depth, params.shrinkage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{generate_donations, load_training_csv, payment_method_label};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn quick_params() -> TrainingParams {
        TrainingParams {
            iterations: 20,
            max_depth: 4,
            shrinkage: 0.2,
        }
    }

    #[test]
    fn test_train_and_predict() {
        let records = generate_donations(120, today(), Some(11));
        let pair = ModelPair::train(&records, quick_params(), today()).unwrap();

        assert_eq!(pair.metrics.rows, 120);
        assert_eq!(pair.schema.width(), 10);
        assert!(pair.metrics.amount_mae.is_finite());

        let prediction = pair.predict(&records[0].features, today()).unwrap();
        // Targets live in [10, 500] and [30, 365) days
        assert!(prediction.amount > 0.0 && prediction.amount < 600.0);
        assert!(prediction.days_until_next > 0 && prediction.days_until_next < 400);
        assert_eq!(
            prediction.next_donation_date,
            today() + Duration::days(prediction.days_until_next)
        );
    }

    #[test]
    fn test_learns_constant_targets() {
        let mut records = generate_donations(30, today(), Some(5));
        for rec in &mut records {
            rec.predicted_donation = 250.0;
            rec.next_donation_date = today() + Duration::days(60);
        }
        let params = TrainingParams {
            iterations: 50,
            max_depth: 3,
            shrinkage: 0.5,
        };
        let pair = ModelPair::train(&records, params, today()).unwrap();
        let prediction = pair.predict(&records[3].features, today()).unwrap();

        assert!((prediction.amount - 250.0).abs() < 1.0, "amount {}", prediction.amount);
        assert!((59..=60).contains(&prediction.days_until_next));
        assert!(pair.metrics.amount_mae < 1.0);
    }

    #[test]
    fn test_offset_date_out_of_range() {
        assert_eq!(
            offset_date(today(), 10).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 25).unwrap()
        );
        assert!(matches!(offset_date(today(), i64::MAX), Err(MlError::InvalidPrediction(_))));
        assert!(matches!(offset_date(today(), 500_000_000), Err(MlError::InvalidPrediction(_))));
    }

    #[test]
    fn test_lowercase_csv_labels_match_requests() {
        let mut csv = String::from(
            "total_donations,total_amount,avg_donation,frequency,last_donation_date,preferred_payment_method,recurring_donor,campaign,predicted_donation,next_donation_date\n",
        );
        for i in 0..20 {
            let (method, amount) = if i % 2 == 0 { ("mpesa", 400) } else { ("cash", 50) };
            csv.push_str(&format!(
                "5,500,100,2,2024-12-01,{},false,1,{},2025-03-01\n",
                method, amount
            ));
        }
        let records = load_training_csv(csv.as_bytes()).unwrap();
        let params = TrainingParams {
            iterations: 50,
            max_depth: 3,
            shrinkage: 0.5,
        };
        let pair = ModelPair::train(&records, params, today()).unwrap();

        // Same label a /predict/ body with "mpesa" produces
        let mut features = records[1].features.clone();
        features.preferred_payment_method = payment_method_label("mpesa");

        let encoded = pair.schema.encode(&features, today());
        let mpesa = pair
            .schema
            .columns()
            .iter()
            .position(|c| c == "preferred_payment_method_Mpesa")
            .unwrap();
        assert_eq!(encoded[mpesa], 1.0);

        let prediction = pair.predict(&features, today()).unwrap();
        assert!(prediction.amount > 300.0, "amount {}", prediction.amount);
    }

    #[test]
    fn test_empty_dataset() {
        assert!(matches!(
            ModelPair::train(&[], quick_params(), today()),
            Err(MlError::EmptyDataset)
        ));
    }

    #[test]
    fn test_serialized_pair_predicts_identically() {
        let records = generate_donations(40, today(), Some(9));
        let pair = ModelPair::train(&records, quick_params(), today()).unwrap();
        let json = serde_json::to_string(&pair).unwrap();
        let restored: ModelPair = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.id, pair.id);
        assert_eq!(restored.schema, pair.schema);
        let a = pair.predict(&records[7].features, today()).unwrap();
        let b = restored.predict(&records[7].features, today()).unwrap();
        assert_eq!(a, b);
    }
}
