use std::path::Path;
use std::sync::Arc;

use tract_onnx::prelude::*;
use tracing::{debug, error, info, warn};

use crate::error::ForecastError;

mod registry;

pub use registry::{ModelLoader, ModelRegistry};

type RunnableModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// A pretrained one-step forecaster: given a window of normalized closes, returns the
/// next normalized close.
#[cfg_attr(test, mockall::automock)]
pub trait SequenceModel: Send + Sync {
    fn predict_next(&self, window: &[f64]) -> Result<f64, ForecastError>;
}

impl<M: SequenceModel + ?Sized> SequenceModel for Box<M> {
    fn predict_next(&self, window: &[f64]) -> Result<f64, ForecastError> {
        (**self).predict_next(window)
    }
}

impl<M: SequenceModel + ?Sized> SequenceModel for Arc<M> {
    fn predict_next(&self, window: &[f64]) -> Result<f64, ForecastError> {
        (**self).predict_next(window)
    }
}

/// ONNX export of a recurrent model with input shape `[1, window, 1]`.
#[derive(Clone)]
pub struct InferenceEngine {
    model: Arc<RunnableModel>,
    window: usize,
}

impl InferenceEngine {
    pub fn load(model_path: &Path, window: usize) -> Result<Self, ForecastError> {
        if !model_path.exists() {
            warn!("ONNX model not found at {:?}", model_path);
            return Err(ForecastError::ModelLoad {
                path: model_path.to_path_buf(),
                reason: "file not found".to_string(),
            });
        }

        info!("Loading ONNX model from {:?}", model_path);
        match Self::load_model(model_path, window) {
            Ok(plan) => Ok(Self {
                model: Arc::new(plan),
                window,
            }),
            Err(e) => {
                error!("Failed to load model {:?}: {}", model_path, e);
                Err(ForecastError::ModelLoad {
                    path: model_path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        }
    }

    fn load_model(path: &Path, window: usize) -> TractResult<RunnableModel> {
        let model = tract_onnx::onnx()
            .model_for_path(path)?
            .with_input_fact(0, f32::fact([1, window, 1]).into())?
            .into_optimized()?
            .into_runnable()?;
        Ok(model)
    }
}

impl SequenceModel for InferenceEngine {
    fn predict_next(&self, window: &[f64]) -> Result<f64, ForecastError> {
        if window.len() != self.window {
            return Err(ForecastError::Inference(format!(
                "model expects a window of {}, got {}",
                self.window,
                window.len()
            )));
        }

        let input: Vec<f32> = window.iter().map(|&v| v as f32).collect();
        let tensor = tract_ndarray::Array::from_shape_vec((1, self.window, 1), input)
            .map_err(|e| ForecastError::Inference(e.to_string()))?
            .into_tensor();

        let result = self
            .model
            .run(tvec!(tensor.into()))
            .map_err(|e| ForecastError::Inference(e.to_string()))?;

        // Output is [1, 1]; the single scalar is the next normalized close
        let output = result[0]
            .to_array_view::<f32>()
            .map_err(|e| ForecastError::Inference(e.to_string()))?;
        let value = output
            .iter()
            .next()
            .copied()
            .ok_or_else(|| ForecastError::Inference("model returned an empty tensor".to_string()))?;

        debug!("Inference output {:.6}", value);
        Ok(f64::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_model_is_model_load_error() {
        let path = PathBuf::from("does/not/exist/lstm_model_BAYN.DE.onnx");
        let err = InferenceEngine::load(&path, 50).err().unwrap();
        match err {
            ForecastError::ModelLoad { path: p, reason } => {
                assert_eq!(p, path);
                assert_eq!(reason, "file not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_corrupt_model_is_model_load_error() {
        let path = std::env::temp_dir().join(format!(
            "finpulse-corrupt-{}.onnx",
            std::process::id()
        ));
        std::fs::write(&path, b"not an onnx graph").unwrap();

        let err = InferenceEngine::load(&path, 50).err().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(err.kind(), "model_load");
    }

    #[test]
    fn test_boxed_model_delegates() {
        let mut mock = MockSequenceModel::new();
        mock.expect_predict_next().returning(|w| Ok(w[w.len() - 1]));

        let boxed: Box<dyn SequenceModel> = Box::new(mock);
        assert_eq!(boxed.predict_next(&[0.1, 0.4]).unwrap(), 0.4);
    }
}
