use common::models::PriceSeries;
use tracing::debug;

use crate::error::ForecastError;
use crate::inference::SequenceModel;
use crate::normalizer::MinMaxNormalizer;

/// Number of trailing closes fed to the model.
pub const WINDOW_SIZE: usize = 50;
/// Number of steps in the canonical forecast.
pub const HORIZON: usize = 2;

/// One ticker's model together with the scaling fitted on that ticker's full history.
pub struct Forecaster<M> {
    model: M,
    normalizer: MinMaxNormalizer,
}

impl<M: SequenceModel> Forecaster<M> {
    pub fn new(model: M, series: &PriceSeries) -> Result<Self, ForecastError> {
        let normalizer = MinMaxNormalizer::fit(&series.closes())?;
        debug!(
            "{}: fitted range [{:.4}, {:.4}] over {} closes",
            series.ticker(),
            normalizer.min(),
            normalizer.max(),
            series.len()
        );
        Ok(Self { model, normalizer })
    }

    /// True when the fitted history is flat; forecasts then repeat the constant close.
    pub fn is_degenerate(&self) -> bool {
        self.normalizer.is_degenerate()
    }

    pub fn predict_next(&self, series: &PriceSeries) -> Result<f64, ForecastError> {
        let window = self.trailing_window(series)?;
        if self.is_degenerate() {
            return Ok(self.normalizer.min());
        }
        let scaled = self.infer(&window)?;
        Ok(self.normalizer.unscale(scaled))
    }

    /// Autoregressive forecast: each step's prediction (still normalized) is appended to
    /// the window and the oldest value dropped before the next inference.
    pub fn predict_horizon(
        &self,
        series: &PriceSeries,
        steps: usize,
    ) -> Result<Vec<f64>, ForecastError> {
        let mut window = self.trailing_window(series)?;
        if self.is_degenerate() {
            debug!("{}: flat history, skipping inference", series.ticker());
            return Ok(vec![self.normalizer.min(); steps]);
        }

        let mut predictions = Vec::with_capacity(steps);
        for _ in 0..steps {
            let scaled = self.infer(&window)?;
            predictions.push(self.normalizer.unscale(scaled));

            window.remove(0);
            window.push(scaled);
        }

        debug!("{}: forecast {:?}", series.ticker(), predictions);
        Ok(predictions)
    }

    pub fn last_actual_and_predictions(
        &self,
        series: &PriceSeries,
    ) -> Result<(f64, Vec<f64>), ForecastError> {
        let predictions = self.predict_horizon(series, HORIZON)?;
        let last_actual = series
            .last()
            .map(|p| p.close)
            .ok_or(ForecastError::InsufficientHistory {
                required: WINDOW_SIZE,
                actual: 0,
            })?;
        Ok((last_actual, predictions))
    }

    fn trailing_window(&self, series: &PriceSeries) -> Result<Vec<f64>, ForecastError> {
        if series.len() < WINDOW_SIZE {
            return Err(ForecastError::InsufficientHistory {
                required: WINDOW_SIZE,
                actual: series.len(),
            });
        }
        let closes: Vec<f64> = series.tail(WINDOW_SIZE).iter().map(|p| p.close).collect();
        Ok(self.normalizer.transform(&closes).to_vec())
    }

    fn infer(&self, window: &[f64]) -> Result<f64, ForecastError> {
        let value = self.model.predict_next(window)?;
        if !value.is_finite() {
            return Err(ForecastError::NonFinitePrediction(value));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::MockSequenceModel;
    use chrono::{Duration, NaiveDate};
    use common::models::PricePoint;
    use mockall::Sequence;
    use std::sync::Mutex;

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PricePoint::new(start + Duration::days(i as i64), c))
            .collect();
        PriceSeries::new("BAYN.DE", points)
    }

    /// 0..=100 ramp, so the fitted range is [0, 100] and scaled = price / 100.
    fn ramp() -> PriceSeries {
        let closes: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        series(&closes)
    }

    /// Model that echoes the mean of its window and records every input.
    struct RecordingModel {
        inputs: Mutex<Vec<Vec<f64>>>,
    }

    impl RecordingModel {
        fn new() -> Self {
            Self {
                inputs: Mutex::new(Vec::new()),
            }
        }
    }

    impl SequenceModel for RecordingModel {
        fn predict_next(&self, window: &[f64]) -> Result<f64, ForecastError> {
            self.inputs.lock().unwrap().push(window.to_vec());
            Ok(window.iter().sum::<f64>() / window.len() as f64)
        }
    }

    #[test]
    fn test_predict_next_unscales_model_output() {
        let mut model = MockSequenceModel::new();
        model
            .expect_predict_next()
            .withf(|w| w.len() == WINDOW_SIZE && (w[WINDOW_SIZE - 1] - 1.0).abs() < 1e-12)
            .times(1)
            .returning(|_| Ok(0.25));

        let s = ramp();
        let forecaster = Forecaster::new(model, &s).unwrap();
        let next = forecaster.predict_next(&s).unwrap();
        assert!((next - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_slides_with_predictions() {
        let s = ramp();
        let forecaster = Forecaster::new(RecordingModel::new(), &s).unwrap();

        let predictions = forecaster.predict_horizon(&s, 3).unwrap();
        assert_eq!(predictions.len(), 3);

        let inputs = forecaster.model.inputs.lock().unwrap();
        assert_eq!(inputs.len(), 3);
        assert!(inputs.iter().all(|w| w.len() == WINDOW_SIZE));

        // First window is the trailing 50 actual closes: 51..=100 scaled
        assert!((inputs[0][0] - 0.51).abs() < 1e-12);
        assert!((inputs[0][WINDOW_SIZE - 1] - 1.0).abs() < 1e-12);

        // Each later window drops its oldest value and ends with the previous prediction
        for step in 1..3 {
            let previous_scaled = predictions[step - 1] / 100.0;
            assert!((inputs[step][WINDOW_SIZE - 1] - previous_scaled).abs() < 1e-12);
            assert_eq!(inputs[step][..WINDOW_SIZE - 1], inputs[step - 1][1..]);
        }
    }

    #[test]
    fn test_second_step_uses_prediction_not_ground_truth() {
        let mut model = MockSequenceModel::new();
        let mut seq = Sequence::new();
        model
            .expect_predict_next()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(0.123));
        model
            .expect_predict_next()
            .withf(|w| w[WINDOW_SIZE - 1] == 0.123 && (w[WINDOW_SIZE - 2] - 1.0).abs() < 1e-12)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(0.5));

        let s = ramp();
        let forecaster = Forecaster::new(model, &s).unwrap();
        let predictions = forecaster.predict_horizon(&s, 2).unwrap();

        assert!((predictions[0] - 12.3).abs() < 1e-9);
        assert!((predictions[1] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_forecast_is_deterministic() {
        let s = ramp();
        let forecaster = Forecaster::new(RecordingModel::new(), &s).unwrap();
        let first = forecaster.predict_horizon(&s, HORIZON).unwrap();
        let second = forecaster.predict_horizon(&s, HORIZON).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_constant_series_returns_constant() {
        let mut model = MockSequenceModel::new();
        model.expect_predict_next().never();

        let s = series(&[42.5; 60]);
        let forecaster = Forecaster::new(model, &s).unwrap();
        assert!(forecaster.is_degenerate());
        assert_eq!(forecaster.predict_horizon(&s, 2).unwrap(), vec![42.5, 42.5]);
        assert_eq!(forecaster.predict_next(&s).unwrap(), 42.5);
    }

    #[test]
    fn test_short_series_is_insufficient_history() {
        let closes: Vec<f64> = (0..49).map(|i| 10.0 + i as f64).collect();
        let s = series(&closes);

        let mut model = MockSequenceModel::new();
        model.expect_predict_next().never();
        let forecaster = Forecaster::new(model, &s).unwrap();

        for err in [
            forecaster.predict_next(&s).unwrap_err(),
            forecaster.predict_horizon(&s, 2).unwrap_err(),
        ] {
            assert!(matches!(
                err,
                ForecastError::InsufficientHistory {
                    required: 50,
                    actual: 49
                }
            ));
        }
    }

    #[test]
    fn test_short_constant_series_is_still_insufficient() {
        let s = series(&[7.0; 10]);
        let forecaster = Forecaster::new(MockSequenceModel::new(), &s).unwrap();
        assert!(matches!(
            forecaster.predict_horizon(&s, 2),
            Err(ForecastError::InsufficientHistory { .. })
        ));
    }

    #[test]
    fn test_empty_series_cannot_be_fitted() {
        let result = Forecaster::new(MockSequenceModel::new(), &PriceSeries::default());
        assert!(matches!(result, Err(ForecastError::EmptySeries)));
    }

    #[test]
    fn test_last_actual_and_predictions() {
        let mut model = MockSequenceModel::new();
        model.expect_predict_next().times(2).returning(|_| Ok(0.9));

        let s = ramp();
        let forecaster = Forecaster::new(model, &s).unwrap();
        let (last, predictions) = forecaster.last_actual_and_predictions(&s).unwrap();

        assert_eq!(last, 100.0);
        assert_eq!(predictions.len(), HORIZON);
        assert!(predictions.iter().all(|p| (p - 90.0).abs() < 1e-9));
    }

    #[test]
    fn test_model_errors_propagate() {
        let mut model = MockSequenceModel::new();
        model
            .expect_predict_next()
            .returning(|_| Err(ForecastError::Inference("session closed".to_string())));

        let s = ramp();
        let forecaster = Forecaster::new(model, &s).unwrap();
        assert!(matches!(
            forecaster.predict_horizon(&s, 2),
            Err(ForecastError::Inference(_))
        ));
    }

    #[test]
    fn test_non_finite_output_is_rejected() {
        let mut model = MockSequenceModel::new();
        model.expect_predict_next().returning(|_| Ok(f64::NAN));

        let s = ramp();
        let forecaster = Forecaster::new(model, &s).unwrap();
        assert!(matches!(
            forecaster.predict_next(&s),
            Err(ForecastError::NonFinitePrediction(_))
        ));
    }
}
