use std::io::Cursor;
use std::path::Path;

use chrono::NaiveDate;
use common::models::{PricePoint, PriceSeries};
use polars::prelude::*;
use tracing::{debug, info};

use crate::error::LoadError;

const DATE_COLUMN: &str = "Date";
const TICKER_COLUMN: &str = "Ticker";
const OPEN_COLUMN: &str = "Open";
const CLOSE_COLUMN: &str = "Close";
const COMPANY_COLUMN: &str = "Company Name";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Processed share prices for every ticker, one row per (ticker, date).
pub struct PriceStore {
    frame: DataFrame,
}

impl PriceStore {
    pub fn from_csv_path(path: &Path) -> Result<Self, LoadError> {
        info!("Loading share prices from {:?}", path);
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;
        Self::from_frame(frame)
    }

    pub fn from_csv_bytes(bytes: Vec<u8>) -> Result<Self, LoadError> {
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;
        Self::from_frame(frame)
    }

    fn from_frame(frame: DataFrame) -> Result<Self, LoadError> {
        for name in [DATE_COLUMN, TICKER_COLUMN, CLOSE_COLUMN] {
            if frame.column(name).is_err() {
                return Err(LoadError::MissingColumn(name.to_string()));
            }
        }
        debug!("Loaded {} share price rows", frame.height());
        Ok(Self { frame })
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    pub fn tickers(&self) -> Result<Vec<String>, LoadError> {
        let unique = string_column(&self.frame, TICKER_COLUMN)?.unique()?;
        let mut tickers: Vec<String> = unique
            .str()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        tickers.sort();
        Ok(tickers)
    }

    /// Full chronologically sorted close history of `ticker`. Opening prices are
    /// attached when the file has an `Open` column.
    pub fn series(&self, ticker: &str) -> Result<PriceSeries, LoadError> {
        let rows = self.rows_for(ticker)?;

        let dates = string_column(&rows, DATE_COLUMN)?;
        let closes = float_column(&rows, CLOSE_COLUMN)?;
        let opens: Vec<Option<f64>> = match rows.column(OPEN_COLUMN) {
            Ok(_) => float_column(&rows, OPEN_COLUMN)?.f64()?.into_iter().collect(),
            Err(_) => vec![None; rows.height()],
        };

        let mut points = Vec::with_capacity(rows.height());
        for (row, (date, close)) in dates.str()?.into_iter().zip(closes.f64()?).enumerate() {
            let (Some(date), Some(close)) = (date, close) else {
                return Err(LoadError::MissingClose {
                    ticker: ticker.to_string(),
                    row,
                });
            };
            let date = parse_date(date).ok_or_else(|| LoadError::InvalidDate {
                ticker: ticker.to_string(),
                row,
                value: date.to_string(),
            })?;
            let open = opens.get(row).copied().flatten();
            points.push(PricePoint::new(date, close).with_open(open));
        }

        debug!("{}: {} price points", ticker, points.len());
        Ok(PriceSeries::new(ticker, points))
    }

    pub fn company_name(&self, ticker: &str) -> Result<Option<String>, LoadError> {
        if self.frame.column(COMPANY_COLUMN).is_err() {
            return Ok(None);
        }
        let rows = self.rows_for(ticker)?;
        let names = string_column(&rows, COMPANY_COLUMN)?;
        let name = names.str()?.into_iter().flatten().next().map(str::to_string);
        Ok(name)
    }

    fn rows_for(&self, ticker: &str) -> Result<DataFrame, LoadError> {
        let rows = self
            .frame
            .clone()
            .lazy()
            .filter(col(TICKER_COLUMN).cast(DataType::String).eq(lit(ticker)))
            .collect()?;
        if rows.height() == 0 {
            return Err(LoadError::UnknownTicker(ticker.to_string()));
        }
        Ok(rows)
    }
}

fn string_column(frame: &DataFrame, name: &str) -> Result<Series, LoadError> {
    let column = frame
        .column(name)
        .map_err(|_| LoadError::MissingColumn(name.to_string()))?;
    Ok(column.as_materialized_series().cast(&DataType::String)?)
}

fn float_column(frame: &DataFrame, name: &str) -> Result<Series, LoadError> {
    let column = frame
        .column(name)
        .map_err(|_| LoadError::MissingColumn(name.to_string()))?;
    Ok(column.as_materialized_series().cast(&DataType::Float64)?)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    // Accept plain dates as well as "YYYY-MM-DD HH:MM:SS" exports
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "\
Ticker,Company Name,Date,Open,Close
BAYN.DE,Bayer AG,2024-01-03,30.1,30.5
BAYN.DE,Bayer AG,2024-01-02,30.0,30.2
FRE.DE,Fresenius SE,2024-01-02,28.0,28.4
BAYN.DE,Bayer AG,2024-01-04,30.6,31.0
FRE.DE,Fresenius SE,2024-01-03,28.4,28.1
";

    fn store() -> PriceStore {
        PriceStore::from_csv_bytes(FIXTURE.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_series_sorted_by_date() {
        let series = store().series("BAYN.DE").unwrap();
        assert_eq!(series.ticker(), "BAYN.DE");
        assert_eq!(series.closes(), vec![30.2, 30.5, 31.0]);
        assert_eq!(
            series.last().unwrap().date,
            NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()
        );
    }

    #[test]
    fn test_series_carries_open_prices() {
        let series = store().series("BAYN.DE").unwrap();
        let opens: Vec<Option<f64>> = series.points().iter().map(|p| p.open).collect();
        assert_eq!(opens, vec![Some(30.0), Some(30.1), Some(30.6)]);

        let snapshot = series.snapshot().unwrap();
        assert_eq!(snapshot.latest_open, Some(30.6));
        assert_eq!(snapshot.latest_close, 31.0);
    }

    #[test]
    fn test_series_without_open_column() {
        let csv = "Ticker,Date,Close\nBAYN.DE,2024-01-02,30.0\nBAYN.DE,2024-01-03,30.4\n";
        let store = PriceStore::from_csv_bytes(csv.as_bytes().to_vec()).unwrap();
        let series = store.series("BAYN.DE").unwrap();
        assert!(series.points().iter().all(|p| p.open.is_none()));
        assert_eq!(series.snapshot().unwrap().latest_open, None);
    }

    #[test]
    fn test_tickers_and_company_name() {
        let store = store();
        assert_eq!(store.row_count(), 5);
        assert_eq!(store.tickers().unwrap(), vec!["BAYN.DE", "FRE.DE"]);
        assert_eq!(
            store.company_name("FRE.DE").unwrap().as_deref(),
            Some("Fresenius SE")
        );
    }

    #[test]
    fn test_unknown_ticker() {
        let err = store().series("SAP.DE").unwrap_err();
        assert!(matches!(err, LoadError::UnknownTicker(t) if t == "SAP.DE"));
    }

    #[test]
    fn test_missing_close_column() {
        let csv = "Ticker,Date,Open\nBAYN.DE,2024-01-02,30.0\n";
        let err = PriceStore::from_csv_bytes(csv.as_bytes().to_vec())
            .err()
            .unwrap();
        assert!(matches!(err, LoadError::MissingColumn(c) if c == "Close"));
    }

    #[test]
    fn test_invalid_date() {
        let csv = "Ticker,Date,Close\nBAYN.DE,yesterday,30.0\n";
        let store = PriceStore::from_csv_bytes(csv.as_bytes().to_vec()).unwrap();
        let err = store.series("BAYN.DE").unwrap_err();
        assert!(matches!(err, LoadError::InvalidDate { row: 0, .. }));
    }

    #[test]
    fn test_parse_date_with_time_suffix() {
        assert_eq!(
            parse_date("2024-02-29 00:00:00"),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(parse_date("29.02.2024"), None);
    }
}
