use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ParseError, PricePoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RiskProfile {
    #[default]
    High,
    Low,
}

impl FromStr for RiskProfile {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "low" => Ok(Self::Low),
            _ => Err(ParseError::RiskProfile(s.to_string())),
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => f.write_str("High"),
            Self::Low => f.write_str("Low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Buy,
    Hold,
    BuyAndSellNextDay,
    Sell,
}

impl Action {
    /// Label shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Hold => "HOLD",
            Self::BuyAndSellNextDay => "BUY and SELL next day",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatedPrice {
    pub date: NaiveDate,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerForecast {
    pub ticker: String,
    pub company_name: Option<String>,
    pub last_actual: PricePoint,
    pub predictions: Vec<DatedPrice>,
    /// Move between the first and second predicted close, in percent.
    pub predicted_change_pct: Option<f64>,
    pub recommendation: Action,
    pub risk_profile: RiskProfile,
    /// Flat history: predictions repeat the constant close, the model was not consulted.
    pub degenerate: bool,
    pub recent: Vec<PricePoint>,
}

/// Result of one ticker's pipeline. A failure stays scoped to its ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TickerOutcome {
    Forecast(TickerForecast),
    Failed {
        ticker: String,
        kind: String,
        error: String,
    },
}

impl TickerOutcome {
    pub fn ticker(&self) -> &str {
        match self {
            Self::Forecast(forecast) => &forecast.ticker,
            Self::Failed { ticker, .. } => ticker,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}
