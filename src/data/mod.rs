//! Donation datasets: record types, CSV loading and synthetic generation

pub mod dates;
pub mod errors;
pub mod labels;
pub mod loader;
pub mod synthetic;

// Re-export commonly used types
pub use errors::{DataError, DataResult};
pub use labels::{campaign_label, capitalize, payment_method_label};
pub use loader::{load_training_csv, load_training_file, REQUIRED_COLUMNS};
pub use synthetic::{generate_donations, write_csv};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Behavioral features describing one donor's giving history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorFeatures {
    pub total_donations: f64,
    pub total_amount: f64,
    pub avg_donation: f64,
    pub frequency: f64,
    pub last_donation_date: NaiveDate,
    pub preferred_payment_method: String,
    pub recurring_donor: bool,
    pub campaign: String,
}

/// One labelled row of a training dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub features: DonorFeatures,
    /// Observed amount of the next donation
    pub predicted_donation: f64,
    /// Observed date of the next donation
    pub next_donation_date: NaiveDate,
}
