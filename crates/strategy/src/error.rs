use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Insufficient history: {required} observations required, {actual} available")]
    InsufficientHistory { required: usize, actual: usize },
    #[error("Cannot fit a normalizer on an empty price series")]
    EmptySeries,
    #[error("Failed to load model {path:?}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Model produced a non-finite value: {0}")]
    NonFinitePrediction(f64),
}

impl ForecastError {
    /// Stable machine-readable name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InsufficientHistory { .. } => "insufficient_history",
            Self::EmptySeries => "empty_series",
            Self::ModelLoad { .. } => "model_load",
            Self::Inference(_) => "inference",
            Self::NonFinitePrediction(_) => "non_finite_prediction",
        }
    }
}
