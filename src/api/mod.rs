//! HTTP layer: training and prediction endpoints plus donor lookups

pub mod errors;
pub mod handlers;
pub mod request;

pub use errors::ApiError;
pub use request::PredictRequest;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::donors::DonorRepository;
use crate::ml::{ModelStore, TrainingParams};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub models: Arc<ModelStore>,
    pub donors: Option<DonorRepository>,
    pub params: TrainingParams,
    /// Fixed "today" for date arithmetic; the current UTC date when unset
    pub reference_date: Option<NaiveDate>,
}

impl AppState {
    pub fn new(models: Arc<ModelStore>, params: TrainingParams) -> Self {
        Self {
            models,
            donors: None,
            params,
            reference_date: None,
        }
    }

    pub fn with_donors(mut self, donors: DonorRepository) -> Self {
        self.donors = Some(donors);
        self
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Returns the effective date for encoding, respecting a fixed reference date
    pub fn effective_date(&self) -> NaiveDate {
        self.reference_date.unwrap_or_else(|| Utc::now().date_naive())
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/train", post(handlers::train))
        .route("/train/", post(handlers::train))
        .route("/predict", post(handlers::predict))
        .route("/predict/", post(handlers::predict))
        .route("/donors", get(handlers::list_donors))
        .route("/donors/:donor_id", get(handlers::get_donor))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Bind `address` and serve until Ctrl-C
pub async fn serve(address: &str, state: AppState, max_upload_bytes: usize) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on {}", address);

    axum::serve(listener, router(state, max_upload_bytes))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("HTTP server error")?;

    Ok(())
}
