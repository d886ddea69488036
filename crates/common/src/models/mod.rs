pub mod price;
pub mod sector;
pub mod signal;

pub use price::{PricePoint, PriceSeries, Snapshot, TimeRange, pct_change, sector_movement};
pub use sector::Sector;
pub use signal::{Action, DatedPrice, RiskProfile, TickerForecast, TickerOutcome};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown risk profile {0:?} (expected High or Low)")]
    RiskProfile(String),
    #[error("Unknown time range {0:?}")]
    TimeRange(String),
    #[error("Unknown sector {0:?}")]
    Sector(String),
}
