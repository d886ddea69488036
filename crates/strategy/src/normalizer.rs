use ndarray::{Array1, ArrayView1};

use crate::error::ForecastError;

/// Min-max scaler over closing prices.
///
/// Only constructible through [`MinMaxNormalizer::fit`], so every transform runs on a
/// fitted range. A flat series (`max == min`) is degenerate: `transform` maps every value
/// to `0.0` instead of dividing by zero and `inverse_transform` yields the constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxNormalizer {
    min: f64,
    max: f64,
}

impl MinMaxNormalizer {
    pub fn fit(values: &[f64]) -> Result<Self, ForecastError> {
        if values.is_empty() {
            return Err(ForecastError::EmptySeries);
        }
        let view = ArrayView1::from(values);
        let min = view.fold(f64::INFINITY, |acc, &v| acc.min(v));
        let max = view.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }

    pub fn scale(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        (value - self.min) / (self.max - self.min)
    }

    pub fn unscale(&self, value: f64) -> f64 {
        value * (self.max - self.min) + self.min
    }

    pub fn transform(&self, values: &[f64]) -> Array1<f64> {
        ArrayView1::from(values).mapv(|v| self.scale(v))
    }

    pub fn inverse_transform(&self, values: &[f64]) -> Array1<f64> {
        ArrayView1::from(values).mapv(|v| self.unscale(v))
    }
}
