// donorcast - donation forecasting service
// Trains gradient boosted regressors on donor giving history and predicts
// each donor's next contribution amount and date over HTTP.

#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod api;
pub mod cli;
pub mod config;
pub mod data;
pub mod db;
pub mod donors;
pub mod ml;

// Re-export commonly used items
pub use config::Config;
pub use data::{DonorFeatures, TrainingRecord};
pub use ml::{ModelPair, ModelStore};
