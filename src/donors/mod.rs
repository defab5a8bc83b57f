//! Persisted donor profiles and their latest prediction

pub mod repository;

pub use repository::DonorRepository;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data::DonorFeatures;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DonorProfile {
    pub donor_id: i32,
    pub total_donations: i32,
    pub total_amount: f64,
    pub avg_donation: f64,
    pub frequency: i32,
    pub last_donation_date: NaiveDate,
    pub preferred_payment_method: String,
    pub recurring_donor: bool,
    pub campaign: String,
    pub predicted_donation: Option<f64>,
    pub next_donation_date: Option<NaiveDate>,
    pub predicted_by_model: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input side of a donor profile, as written on create/update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDonorProfile {
    pub donor_id: i32,
    pub total_donations: i32,
    pub total_amount: f64,
    pub avg_donation: f64,
    pub frequency: i32,
    pub last_donation_date: NaiveDate,
    pub preferred_payment_method: String,
    pub recurring_donor: bool,
    pub campaign: String,
}

impl NewDonorProfile {
    /// `None` when a count does not fit the table's integer columns
    pub fn from_features(donor_id: i32, features: &DonorFeatures) -> Option<Self> {
        Some(Self {
            donor_id,
            total_donations: count_column(features.total_donations)?,
            total_amount: round_cents(features.total_amount),
            avg_donation: round_cents(features.avg_donation),
            frequency: count_column(features.frequency)?,
            last_donation_date: features.last_donation_date,
            preferred_payment_method: features.preferred_payment_method.clone(),
            recurring_donor: features.recurring_donor,
            campaign: features.campaign.clone(),
        })
    }
}

/// Round a count to the nearest whole number if it fits an `INTEGER` column
pub fn count_column(value: f64) -> Option<i32> {
    let rounded = value.round();
    if rounded.is_finite() && rounded >= i32::MIN as f64 && rounded <= i32::MAX as f64 {
        Some(rounded as i32)
    } else {
        None
    }
}

impl std::fmt::Display for DonorProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Donor {}", self.donor_id)
    }
}

/// Money columns keep two decimal places
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
