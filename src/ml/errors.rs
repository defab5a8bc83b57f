use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by training, persisting or querying the model pair
#[derive(Error, Debug)]
pub enum MlError {
    #[error("Model file not found at {}. Please train the model first.", .path.display())]
    NotTrained { path: PathBuf },

    #[error("Cannot train on an empty dataset")]
    EmptyDataset,

    #[error("Regressor has not been fitted")]
    NotFitted,

    #[error("Feature vector has {actual} columns but the model expects {expected}")]
    SchemaMismatch { expected: usize, actual: usize },

    #[error("Prediction out of range: {0}")]
    InvalidPrediction(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for model operations
pub type MlResult<T> = Result<T, MlError>;
