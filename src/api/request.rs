//! Validation and normalization of prediction requests
//!
//! Clients send loosely typed JSON (numbers as strings, flags as strings,
//! campaign ids as numbers), so the body is read as a `serde_json::Value`
//! and coerced field by field.

use serde_json::{Map, Value};

use super::ApiError;
use crate::data::dates::parse_date;
use crate::data::{campaign_label, payment_method_label, DonorFeatures};
use crate::donors::count_column;

pub const REQUIRED_FIELDS: [&str; 8] = [
    "total_donations",
    "total_amount",
    "avg_donation",
    "frequency",
    "last_donation_date",
    "preferred_payment_method",
    "recurring_donor",
    "campaign",
];

/// A validated prediction request
#[derive(Debug, Clone, PartialEq)]
pub struct PredictRequest {
    pub donor_id: Option<i32>,
    pub features: DonorFeatures,
}

impl PredictRequest {
    pub fn from_json(body: &Value) -> Result<Self, ApiError> {
        let data = body
            .as_object()
            .ok_or_else(|| ApiError::bad_request("Request body must be a JSON object"))?;

        if let Some(field) = REQUIRED_FIELDS.iter().find(|f| !data.contains_key(**f)) {
            return Err(ApiError::bad_request(format!("Missing required field: {}", field)));
        }

        let frequency = normalize_frequency(&data["frequency"]);

        let last_donation_date = data["last_donation_date"]
            .as_str()
            .and_then(parse_date)
            .ok_or_else(|| ApiError::bad_request("Invalid date format for last_donation_date"))?;

        let preferred_payment_method = payment_method_label(&stringify(&data["preferred_payment_method"]));

        let recurring_donor = normalize_flag(&data["recurring_donor"])
            .ok_or_else(|| ApiError::bad_request("recurring_donor must be a boolean"))?;

        let campaign = campaign_label(&stringify(&data["campaign"]));

        let numbers: Option<Vec<f64>> = ["total_donations", "total_amount", "avg_donation"]
            .iter()
            .map(|f| data[*f].as_f64())
            .collect();
        let numbers = numbers.ok_or_else(|| {
            ApiError::bad_request(
                "total_donations, total_amount, and avg_donation must be integers or floats",
            )
        })?;

        if count_column(numbers[0]).is_none() {
            return Err(ApiError::bad_request("total_donations is out of range"));
        }
        if i32::try_from(frequency).is_err() {
            return Err(ApiError::bad_request("frequency is out of range"));
        }

        Ok(Self {
            donor_id: donor_id(data)?,
            features: DonorFeatures {
                total_donations: numbers[0],
                total_amount: numbers[1],
                avg_donation: numbers[2],
                frequency: frequency as f64,
                last_donation_date,
                preferred_payment_method,
                recurring_donor,
                campaign,
            },
        })
    }
}

/// Frequency of zero (or anything unreadable) counts as once
pub fn normalize_frequency(value: &Value) -> i64 {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(*b as i64),
        _ => None,
    };
    match parsed {
        Some(0) | None => 1,
        Some(freq) => freq,
    }
}

pub fn normalize_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn donor_id(data: &Map<String, Value>) -> Result<Option<i32>, ApiError> {
    match data.get("donor_id") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            .and_then(|id| i32::try_from(id).ok())
            .map(Some)
            .ok_or_else(|| ApiError::bad_request("donor_id must be an integer")),
    }
}
