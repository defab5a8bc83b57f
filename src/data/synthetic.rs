//! Synthetic donation datasets for demos and tests

use std::io::Write;

use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use super::loader::REQUIRED_COLUMNS;
use super::{DataResult, DonorFeatures, TrainingRecord};

const PAYMENT_METHODS: [&str; 2] = ["Cash", "Mpesa"];
const CAMPAIGNS: [&str; 2] = ["1", "2"];
const RECURRING_PROBABILITY: f64 = 0.3;

/// Generate `rows` random donation records around `today`.
/// A fixed `seed` yields the same dataset every time.
pub fn generate_donations(rows: usize, today: NaiveDate, seed: Option<u64>) -> Vec<TrainingRecord> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    (0..rows)
        .map(|_| {
            let last_gap = rng.gen_range(1..365u64);
            let next_gap = rng.gen_range(30..365u64);
            TrainingRecord {
                features: DonorFeatures {
                    total_donations: rng.gen_range(1..50) as f64,
                    total_amount: round2(rng.gen_range(100.0..5000.0)),
                    avg_donation: round2(rng.gen_range(10.0..500.0)),
                    frequency: rng.gen_range(1..12) as f64,
                    last_donation_date: today - Days::new(last_gap),
                    preferred_payment_method: pick(&mut rng, &PAYMENT_METHODS),
                    recurring_donor: rng.gen_bool(RECURRING_PROBABILITY),
                    campaign: pick(&mut rng, &CAMPAIGNS),
                },
                predicted_donation: round2(rng.gen_range(10.0..500.0)),
                next_donation_date: today + Days::new(next_gap),
            }
        })
        .collect()
}

/// Write records as a training CSV with the standard header
pub fn write_csv<W: Write>(records: &[TrainingRecord], sink: W) -> DataResult<()> {
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(REQUIRED_COLUMNS)?;

    for rec in records {
        let f = &rec.features;
        writer.write_record([
            f.total_donations.to_string(),
            f.total_amount.to_string(),
            f.avg_donation.to_string(),
            f.frequency.to_string(),
            f.last_donation_date.format("%Y-%m-%d").to_string(),
            f.preferred_payment_method.clone(),
            if f.recurring_donor { "True" } else { "False" }.to_string(),
            f.campaign.clone(),
            rec.predicted_donation.to_string(),
            rec.next_donation_date.format("%Y-%m-%d").to_string(),
        ])?;
    }

    writer.flush()?;
    info!("Wrote {} synthetic donation records", records.len());
    Ok(())
}

fn pick(rng: &mut StdRng, choices: &[&str]) -> String {
    choices.choose(rng).copied().unwrap_or_default().to_string()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
