use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Share price file could not be read: {0}")]
    Csv(#[from] PolarsError),
    #[error("Share price file has no {0:?} column")]
    MissingColumn(String),
    #[error("Invalid date {value:?} in row {row} for {ticker}")]
    InvalidDate {
        ticker: String,
        row: usize,
        value: String,
    },
    #[error("Missing date or close price in row {row} for {ticker}")]
    MissingClose { ticker: String, row: usize },
    #[error("No price rows for ticker {0}")]
    UnknownTicker(String),
}
