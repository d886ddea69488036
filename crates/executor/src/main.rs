use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tracing::{debug, error, info, warn};

use common::config::Settings;
use common::logger;
use common::models::{PriceSeries, RiskProfile, Sector, TickerOutcome, TimeRange, sector_movement};
use storage::PriceStore;
use strategy::{ForecastJob, ModelRegistry, StrategyService, WINDOW_SIZE};

use crate::services::report_service::ReportWriter;

mod services;

#[derive(Debug, Parser)]
#[command(
    name = "finpulse",
    about = "Two-day close forecasts and trade recommendations for German equities"
)]
struct Args {
    /// Ticker to forecast, repeatable. Defaults to every ticker in the price file.
    #[arg(long = "ticker")]
    tickers: Vec<String>,

    /// Forecast every ticker of a sector (pharmaceutical, automotive).
    #[arg(long, conflicts_with = "tickers")]
    sector: Option<Sector>,

    /// Risk profile (high or low). Overrides RISK_PROFILE.
    #[arg(long)]
    risk: Option<RiskProfile>,

    /// Processed share price CSV. Overrides PRICES_CSV.
    #[arg(long)]
    prices: Option<PathBuf>,

    /// Directory holding lstm_model_<TICKER>.onnx files. Overrides MODELS_DIR.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Range used for the price snapshot and sector movement.
    #[arg(long, default_value = "daily")]
    range: TimeRange,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logger::setup_logger();
    debug!("System starting up...");

    let args = Args::parse();
    let settings = Settings::from_env();

    let prices_path = args.prices.clone().unwrap_or(settings.prices_csv);
    let models_dir = args.models_dir.clone().unwrap_or(settings.models_dir);
    let risk_profile = args.risk.unwrap_or(settings.risk_profile);

    let store = PriceStore::from_csv_path(&prices_path)
        .with_context(|| format!("loading share prices from {:?}", prices_path))?;
    debug!("{} rows in {:?}", store.row_count(), prices_path);

    let tickers = match args.sector {
        Some(sector) => sector.tickers().iter().map(|t| t.to_string()).collect(),
        None if !args.tickers.is_empty() => args.tickers.clone(),
        None => store.tickers().context("listing tickers")?,
    };
    info!(
        "Forecasting {} tickers with models from {:?}",
        tickers.len(),
        models_dir
    );

    let mut report = ReportWriter::new(std::io::stdout().lock());
    let mut jobs = Vec::with_capacity(tickers.len());
    let mut load_failures = Vec::new();

    for ticker in &tickers {
        let series = match store.series(ticker) {
            Ok(series) => series,
            Err(e) => {
                error!("{}: could not load prices: {}", ticker, e);
                load_failures.push(TickerOutcome::Failed {
                    ticker: ticker.clone(),
                    kind: "data".to_string(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        if let Some(snapshot) = series.filter_range(args.range).snapshot() {
            report.snapshot(&snapshot)?;
        }

        let company_name = store.company_name(ticker).unwrap_or_else(|e| {
            warn!("{}: no company name: {}", ticker, e);
            None
        });
        jobs.push(ForecastJob::new(series).with_company_name(company_name));
    }

    if let Some(sector) = args.sector {
        let all: Vec<PriceSeries> = jobs.iter().map(|job| job.series.clone()).collect();
        if let Some(movement) = sector_movement(&all, args.range) {
            info!("{} sector movement ({}): {:+.2}%", sector, args.range, movement);
            report.sector_movement(sector, args.range, movement)?;
        }
    }

    let registry = ModelRegistry::new(models_dir, WINDOW_SIZE);
    let service = StrategyService::new(Arc::new(registry)).with_risk_profile(risk_profile);
    info!("Running {} forecasts with {} risk", jobs.len(), service.risk_profile());

    let mut outcomes = service.run_batch(jobs).await;
    outcomes.extend(load_failures);
    order_like(&mut outcomes, &tickers);

    for outcome in &outcomes {
        report.outcome(outcome)?;
    }
    let written = report.lines();
    report.into_inner()?;

    let failed = outcomes.iter().filter(|o| o.is_failed()).count();
    info!(
        "Done: {} forecasts, {} failures, {} report lines",
        outcomes.len() - failed,
        failed,
        written
    );
    Ok(())
}

/// Restores the order in which tickers were requested.
fn order_like(outcomes: &mut [TickerOutcome], tickers: &[String]) {
    outcomes.sort_by_key(|o| {
        tickers
            .iter()
            .position(|t| t == o.ticker())
            .unwrap_or(usize::MAX)
    });
}
