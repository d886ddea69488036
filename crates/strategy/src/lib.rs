//! Forecasting core: min-max scaling, autoregressive multi-step inference over a
//! pretrained sequence model, and the recommendation policy built on top of it.

pub mod error;
pub mod forecaster;
pub mod inference;
pub mod normalizer;
pub mod recommendation;
pub mod services;

pub use error::ForecastError;
pub use forecaster::{Forecaster, HORIZON, WINDOW_SIZE};
pub use inference::{InferenceEngine, ModelLoader, ModelRegistry, SequenceModel};
pub use normalizer::MinMaxNormalizer;
pub use recommendation::recommend;
pub use services::strategy_service::{ForecastJob, StrategyService};
