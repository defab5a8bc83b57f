//! Feature encoding shared by training and inference
//!
//! Columns are laid out as: numeric fields, one-hot payment method columns,
//! one-hot campaign columns, then `days_since_last_donation`. Categories are
//! sorted so the same dataset always yields the same layout. At inference a
//! record is encoded by name against the persisted column list: columns the
//! record does not produce are zero, and the order is the training order.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::data::DonorFeatures;

pub const PAYMENT_METHOD_PREFIX: &str = "preferred_payment_method_";
pub const CAMPAIGN_PREFIX: &str = "campaign_";
pub const DAYS_SINCE_LAST_DONATION: &str = "days_since_last_donation";

const NUMERIC_COLUMNS: [&str; 5] = [
    "total_donations",
    "total_amount",
    "avg_donation",
    "frequency",
    "recurring_donor",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    /// Build the column layout from every category seen in `records`
    pub fn fit<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a DonorFeatures>,
    {
        let mut payment_methods = BTreeSet::new();
        let mut campaigns = BTreeSet::new();
        for rec in records {
            payment_methods.insert(rec.preferred_payment_method.clone());
            campaigns.insert(rec.campaign.clone());
        }

        let mut columns: Vec<String> = NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.extend(payment_methods.iter().map(|m| format!("{}{}", PAYMENT_METHOD_PREFIX, m)));
        columns.extend(campaigns.iter().map(|c| format!("{}{}", CAMPAIGN_PREFIX, c)));
        columns.push(DAYS_SINCE_LAST_DONATION.to_string());

        Self { columns }
    }

    /// Schema with an explicit column list, e.g. one read back from disk
    pub fn from_columns(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Encode one record in this schema's column order
    pub fn encode(&self, features: &DonorFeatures, today: NaiveDate) -> Vec<f32> {
        self.columns
            .iter()
            .map(|column| column_value(column, features, today))
            .collect()
    }

    /// Encode a record for inference, warning about categories the
    /// schema has never seen (they encode as all zeros)
    pub fn encode_for_inference(&self, features: &DonorFeatures, today: NaiveDate) -> Vec<f32> {
        if !self.knows(PAYMENT_METHOD_PREFIX, &features.preferred_payment_method) {
            warn!(
                payment_method = %features.preferred_payment_method,
                "Payment method not seen during training"
            );
        }
        if !self.knows(CAMPAIGN_PREFIX, &features.campaign) {
            warn!(campaign = %features.campaign, "Campaign not seen during training");
        }
        self.encode(features, today)
    }

    fn knows(&self, prefix: &str, label: &str) -> bool {
        self.columns
            .iter()
            .any(|c| c.strip_prefix(prefix) == Some(label))
    }
}

/// Whole days between the last donation and `today`
pub fn days_since(last_donation: NaiveDate, today: NaiveDate) -> i64 {
    (today - last_donation).num_days()
}

fn column_value(column: &str, f: &DonorFeatures, today: NaiveDate) -> f32 {
    match column {
        "total_donations" => f.total_donations as f32,
        "total_amount" => f.total_amount as f32,
        "avg_donation" => f.avg_donation as f32,
        "frequency" => f.frequency as f32,
        "recurring_donor" => one_if(f.recurring_donor),
        DAYS_SINCE_LAST_DONATION => days_since(f.last_donation_date, today) as f32,
        other => {
            if let Some(label) = other.strip_prefix(PAYMENT_METHOD_PREFIX) {
                one_if(label == f.preferred_payment_method)
            } else if let Some(label) = other.strip_prefix(CAMPAIGN_PREFIX) {
                one_if(label == f.campaign)
            } else {
                0.0
            }
        }
    }
}

fn one_if(flag: bool) -> f32 {
    if flag {
        1.0
    } else {
        0.0
    }
}
