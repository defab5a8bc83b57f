use axum::body::Bytes;
use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::{ApiError, AppState, PredictRequest};
use crate::data::load_training_csv;
use crate::donors::{round_cents, DonorProfile, NewDonorProfile};
use crate::ml::ModelPair;

const UPLOAD_FIELD: &str = "file";
const DEFAULT_LIST_LIMIT: i64 = 100;
const MAX_LIST_LIMIT: i64 = 1000;

#[derive(Debug, Serialize, Deserialize)]
pub struct TrainResponse {
    pub message: String,
    pub model_id: Uuid,
    pub rows: usize,
    pub feature_columns: Vec<String>,
    pub amount_mae: f64,
    pub days_mae: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predicted_donation: f64,
    pub next_donation_date: String,
    pub model_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

/// Fit both regressors on an uploaded CSV and persist them
pub async fn train(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<TrainResponse>, ApiError> {
    let mut upload: Option<Bytes> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
            upload = Some(bytes);
            break;
        }
    }

    let csv = upload.ok_or_else(|| ApiError::bad_request("Missing CSV upload in field 'file'"))?;
    info!(bytes = csv.len(), "Received training upload");

    let today = state.effective_date();
    let params = state.params;
    let store = state.models.clone();

    // CPU-bound: keep the fit off the async workers
    let pair = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let records = load_training_csv(csv.as_ref())?;
        let pair = ModelPair::train(&records, params, today)?;
        Ok(store.save(pair)?)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Training task failed: {}", e)))??;

    Ok(Json(TrainResponse {
        message: "Models trained and saved successfully".to_string(),
        model_id: pair.id,
        rows: pair.metrics.rows,
        feature_columns: pair.schema.columns().to_vec(),
        amount_mae: pair.metrics.amount_mae,
        days_mae: pair.metrics.days_mae,
    }))
}

/// Predict next donation amount and date
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    let data: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))?;
    info!(body = %data, "Received data");

    let request = PredictRequest::from_json(&data)?;
    let pair = state.models.load()?;
    let prediction = pair.predict(&request.features, state.effective_date())?;
    let predicted_donation = round_cents(prediction.amount);

    if let (Some(donor_id), Some(donors)) = (request.donor_id, state.donors.as_ref()) {
        match NewDonorProfile::from_features(donor_id, &request.features) {
            Some(profile) => {
                let stored = match donors.upsert(&profile).await {
                    Ok(_) => {
                        donors
                            .record_prediction(donor_id, predicted_donation, prediction.next_donation_date, pair.id)
                            .await
                    }
                    Err(e) => Err(e),
                };
                if let Err(e) = stored {
                    warn!(donor_id, "Prediction not persisted: {:#}", e);
                }
            }
            None => warn!(donor_id, "Prediction not persisted: donor counts out of range"),
        }
    }

    Ok(Json(PredictResponse {
        predicted_donation,
        next_donation_date: prediction.next_donation_date.format("%Y-%m-%d").to_string(),
        model_id: pair.id,
        donor_id: request.donor_id,
    }))
}

pub async fn get_donor(
    State(state): State<AppState>,
    Path(donor_id): Path<i32>,
) -> Result<Json<DonorProfile>, ApiError> {
    let donors = state
        .donors
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("Donor storage is not configured".to_string()))?;

    donors
        .get(donor_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Donor {} not found", donor_id)))
}

pub async fn list_donors(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<DonorProfile>>, ApiError> {
    let donors = state
        .donors
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("Donor storage is not configured".to_string()))?;

    Ok(Json(donors.list(list_limit(params.limit)).await?))
}

/// Requested page size clamped to 1..=1000
pub fn list_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model_loaded": state.models.is_available(),
        "database": state.donors.is_some(),
    }))
}
