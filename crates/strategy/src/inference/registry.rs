use std::path::{Path, PathBuf};

use tracing::debug;

use super::{InferenceEngine, SequenceModel};
use crate::error::ForecastError;

/// Resolves a ticker to its pretrained model.
pub trait ModelLoader: Send + Sync {
    fn load(&self, ticker: &str) -> Result<Box<dyn SequenceModel>, ForecastError>;
}

/// Models stored on disk as `<models_dir>/lstm_model_<TICKER>.onnx`.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models_dir: PathBuf,
    window: usize,
}

impl ModelRegistry {
    pub fn new(models_dir: impl Into<PathBuf>, window: usize) -> Self {
        Self {
            models_dir: models_dir.into(),
            window,
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn model_path(&self, ticker: &str) -> PathBuf {
        self.models_dir.join(format!("lstm_model_{}.onnx", ticker))
    }
}

impl ModelLoader for ModelRegistry {
    fn load(&self, ticker: &str) -> Result<Box<dyn SequenceModel>, ForecastError> {
        let path = self.model_path(ticker);
        debug!("Resolved model for {} at {:?}", ticker, path);
        let engine = InferenceEngine::load(&path, self.window)?;
        Ok(Box::new(engine))
    }
}
