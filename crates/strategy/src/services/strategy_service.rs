use std::sync::Arc;

use chrono::Duration;
use common::models::{
    DatedPrice, PriceSeries, RiskProfile, TickerForecast, TickerOutcome, pct_change,
};
use tracing::{debug, error, info, warn};

use crate::error::ForecastError;
use crate::forecaster::{Forecaster, HORIZON};
use crate::inference::ModelLoader;
use crate::recommendation::recommend;

/// Actual closes shown next to the forecast.
const RECENT_POINTS: usize = 5;

#[derive(Debug, Clone)]
pub struct ForecastJob {
    pub series: PriceSeries,
    pub company_name: Option<String>,
}

impl ForecastJob {
    pub fn new(series: PriceSeries) -> Self {
        Self {
            series,
            company_name: None,
        }
    }

    pub fn with_company_name(mut self, name: Option<String>) -> Self {
        self.company_name = name;
        self
    }
}

/// Runs the normalize → forecast → recommend pipeline, one ticker at a time or as a
/// batch of independent tickers.
#[derive(Clone)]
pub struct StrategyService {
    loader: Arc<dyn ModelLoader>,
    risk_profile: RiskProfile,
}

impl StrategyService {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            risk_profile: RiskProfile::default(),
        }
    }

    pub fn with_risk_profile(mut self, risk_profile: RiskProfile) -> Self {
        self.risk_profile = risk_profile;
        self
    }

    pub fn risk_profile(&self) -> RiskProfile {
        self.risk_profile
    }

    pub fn forecast_ticker(&self, job: &ForecastJob) -> Result<TickerForecast, ForecastError> {
        let series = &job.series;
        let ticker = series.ticker();

        let model = self.loader.load(ticker)?;
        let forecaster = Forecaster::new(model, series)?;
        let (last_actual, predictions) = forecaster.last_actual_and_predictions(series)?;

        let (p1, p2) = match predictions.as_slice() {
            [p1, p2, ..] => (*p1, *p2),
            _ => {
                return Err(ForecastError::Inference(format!(
                    "expected {} predictions, got {}",
                    HORIZON,
                    predictions.len()
                )));
            }
        };
        let recommendation = recommend(last_actual, p1, p2, self.risk_profile);

        let last_point = *series.last().ok_or(ForecastError::EmptySeries)?;
        let dated: Vec<DatedPrice> = predictions
            .iter()
            .enumerate()
            .map(|(i, &price)| DatedPrice {
                date: last_point.date + Duration::days(i as i64 + 1),
                price,
            })
            .collect();

        if forecaster.is_degenerate() {
            warn!("{}: flat price history, forecast repeats {:.2}", ticker, last_actual);
        }
        info!(
            "{}: last={:.2} forecast=[{:.2}, {:.2}] risk={} -> {}",
            ticker, last_actual, p1, p2, self.risk_profile, recommendation
        );

        Ok(TickerForecast {
            ticker: ticker.to_string(),
            company_name: job.company_name.clone(),
            last_actual: last_point,
            predictions: dated,
            predicted_change_pct: pct_change(p1, p2),
            recommendation,
            risk_profile: self.risk_profile,
            degenerate: forecaster.is_degenerate(),
            recent: series.tail(RECENT_POINTS).to_vec(),
        })
    }

    pub fn run_ticker(&self, job: &ForecastJob) -> TickerOutcome {
        match self.forecast_ticker(job) {
            Ok(forecast) => TickerOutcome::Forecast(forecast),
            Err(e) => {
                error!("{}: forecast failed: {}", job.series.ticker(), e);
                TickerOutcome::Failed {
                    ticker: job.series.ticker().to_string(),
                    kind: e.kind().to_string(),
                    error: e.to_string(),
                }
            }
        }
    }

    /// Forecasts every job on its own blocking worker. Outcomes keep the order of `jobs`.
    pub async fn run_batch(&self, jobs: Vec<ForecastJob>) -> Vec<TickerOutcome> {
        info!(
            "Running forecasts for {} tickers (risk profile {})",
            jobs.len(),
            self.risk_profile
        );

        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let service = self.clone();
                let ticker = job.series.ticker().to_string();
                let handle = tokio::task::spawn_blocking(move || service.run_ticker(&job));
                (ticker, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (ticker, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!("{}: forecast worker crashed: {}", ticker, e);
                    outcomes.push(TickerOutcome::Failed {
                        ticker,
                        kind: "worker".to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let failed = outcomes.iter().filter(|o| o.is_failed()).count();
        debug!("Batch finished: {} ok, {} failed", outcomes.len() - failed, failed);
        outcomes
    }
}
