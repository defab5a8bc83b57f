use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{DonorProfile, NewDonorProfile};

const PROFILE_COLUMNS: &str = r#"
    donor_id,
    total_donations,
    total_amount,
    avg_donation,
    frequency,
    last_donation_date,
    preferred_payment_method,
    recurring_donor,
    campaign,
    predicted_donation,
    next_donation_date,
    predicted_by_model,
    created_at,
    updated_at
"#;

/// CRUD access to the `donor_profiles` table
#[derive(Clone)]
pub struct DonorRepository {
    pool: PgPool,
}

impl DonorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a donor or overwrite its behavioral fields.
    /// Any stored prediction is kept until the next one is recorded.
    pub async fn upsert(&self, profile: &NewDonorProfile) -> Result<DonorProfile> {
        let sql = format!(
            r#"
            INSERT INTO donor_profiles (
                donor_id, total_donations, total_amount, avg_donation, frequency,
                last_donation_date, preferred_payment_method, recurring_donor, campaign,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            ON CONFLICT (donor_id) DO UPDATE SET
                total_donations = EXCLUDED.total_donations,
                total_amount = EXCLUDED.total_amount,
                avg_donation = EXCLUDED.avg_donation,
                frequency = EXCLUDED.frequency,
                last_donation_date = EXCLUDED.last_donation_date,
                preferred_payment_method = EXCLUDED.preferred_payment_method,
                recurring_donor = EXCLUDED.recurring_donor,
                campaign = EXCLUDED.campaign,
                updated_at = EXCLUDED.updated_at
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );

        let stored = sqlx::query_as::<_, DonorProfile>(&sql)
            .bind(profile.donor_id)
            .bind(profile.total_donations)
            .bind(profile.total_amount)
            .bind(profile.avg_donation)
            .bind(profile.frequency)
            .bind(profile.last_donation_date)
            .bind(&profile.preferred_payment_method)
            .bind(profile.recurring_donor)
            .bind(&profile.campaign)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to upsert donor {}", profile.donor_id))?;

        info!(donor_id = stored.donor_id, "Donor profile saved");
        Ok(stored)
    }

    /// Overwrite the donor's predicted amount and next donation date
    pub async fn record_prediction(
        &self,
        donor_id: i32,
        predicted_donation: f64,
        next_donation_date: NaiveDate,
        model_id: Uuid,
    ) -> Result<Option<DonorProfile>> {
        let sql = format!(
            r#"
            UPDATE donor_profiles
            SET predicted_donation = $2,
                next_donation_date = $3,
                predicted_by_model = $4,
                updated_at = $5
            WHERE donor_id = $1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );

        let updated = sqlx::query_as::<_, DonorProfile>(&sql)
            .bind(donor_id)
            .bind(predicted_donation)
            .bind(next_donation_date)
            .bind(model_id)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to record prediction for donor {}", donor_id))?;

        Ok(updated)
    }

    pub async fn get(&self, donor_id: i32) -> Result<Option<DonorProfile>> {
        let sql = format!("SELECT {} FROM donor_profiles WHERE donor_id = $1", PROFILE_COLUMNS);

        sqlx::query_as::<_, DonorProfile>(&sql)
            .bind(donor_id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to fetch donor {}", donor_id))
    }

    /// Donors ordered by their predicted next donation, soonest first
    pub async fn list(&self, limit: i64) -> Result<Vec<DonorProfile>> {
        let sql = format!(
            "SELECT {} FROM donor_profiles ORDER BY next_donation_date ASC NULLS LAST, donor_id LIMIT $1",
            PROFILE_COLUMNS
        );

        sqlx::query_as::<_, DonorProfile>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list donor profiles")
    }
}
