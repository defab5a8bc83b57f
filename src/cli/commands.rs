use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::api::{self, AppState, PredictRequest};
use crate::config::Config;
use crate::data::{generate_donations, load_training_file, write_csv};
use crate::db::Database;
use crate::donors::{round_cents, DonorRepository};
use crate::ml::{ModelPair, ModelStore, TrainingParams};

/// Run the HTTP API until interrupted
pub async fn serve(
    mut config: Config,
    db: Option<Database>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let store = Arc::new(ModelStore::new(config.model.path.clone()));
    if store.is_available() {
        // Warm the cache so the first prediction doesn't pay for the read
        let pair = store.load()?;
        info!(model_id = %pair.id, "Model pair ready");
    } else {
        info!("No trained model yet; POST a CSV to /train/ first");
    }

    let mut state = AppState::new(store, TrainingParams::from(&config.model));
    if let Some(db) = db {
        state = state.with_donors(DonorRepository::new(db.pool));
    }

    api::serve(&config.bind_address(), state, config.server.max_upload_bytes).await
}

/// Train both regressors from a CSV on disk
pub async fn train(config: &Config, csv: &Path) -> Result<()> {
    let records = load_training_file(csv)
        .with_context(|| format!("Failed to load training data from {}", csv.display()))?;

    let today = Utc::now().date_naive();
    let pair = ModelPair::train(&records, TrainingParams::from(&config.model), today)?;
    let pair = ModelStore::new(config.model.path.clone()).save(pair)?;

    println!("✅ Models trained and saved to {}", config.model.path.display());
    println!("   Model ID: {}", pair.id);
    println!("   Rows: {}, Features: {}", pair.metrics.rows, pair.schema.width());
    println!("   Donation Model MAE: {:.4}", pair.metrics.amount_mae);
    println!("   Date Model MAE: {:.4}", pair.metrics.days_mae);
    Ok(())
}

/// Predict for one donor described in a JSON file
pub async fn predict(config: &Config, json: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(json)
        .with_context(|| format!("Failed to read {}", json.display()))?;
    let body: serde_json::Value = serde_json::from_str(&raw).context("Invalid JSON document")?;
    let request = PredictRequest::from_json(&body)?;

    let pair = ModelStore::new(config.model.path.clone()).load()?;
    let prediction = pair.predict(&request.features, Utc::now().date_naive())?;

    println!("Predicted Donation: {:.2}", round_cents(prediction.amount));
    println!("Predicted Date: {}", prediction.next_donation_date.format("%Y-%m-%d"));
    Ok(())
}

/// Write a synthetic dataset to `out`
pub fn generate(rows: usize, out: &Path, seed: Option<u64>) -> Result<()> {
    let records = generate_donations(rows, Utc::now().date_naive(), seed);
    let file = File::create(out).with_context(|| format!("Failed to create {}", out.display()))?;
    write_csv(&records, file)?;

    println!("Generated {} records and saved to {}", rows, out.display());
    Ok(())
}
