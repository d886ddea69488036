use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: None,
            close,
        }
    }

    pub fn with_open(mut self, open: Option<f64>) -> Self {
        self.open = open;
        self
    }
}

/// Closing prices of one ticker, kept in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    ticker: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self {
            ticker: ticker.into(),
            points,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// The last `n` points, or the whole series when it is shorter.
    pub fn tail(&self, n: usize) -> &[PricePoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }

    pub fn filter_range(&self, range: TimeRange) -> PriceSeries {
        let points = match (range, range.lookback_days()) {
            (_, Some(days)) => self.since_days(days),
            (TimeRange::Daily, None) => self.tail(2).to_vec(),
            (TimeRange::LastFiveDays, None) => self.tail(5).to_vec(),
            _ => self.points.clone(),
        };
        Self {
            ticker: self.ticker.clone(),
            points,
        }
    }

    fn since_days(&self, days: i64) -> Vec<PricePoint> {
        let Some(latest) = self.last() else {
            return Vec::new();
        };
        self.since(latest.date - Duration::days(days))
    }

    fn since(&self, cutoff: NaiveDate) -> Vec<PricePoint> {
        self.points
            .iter()
            .filter(|p| p.date >= cutoff)
            .copied()
            .collect()
    }

    /// Latest close compared with the row before it (or with itself for a single row).
    pub fn snapshot(&self) -> Option<Snapshot> {
        let latest = self.last()?;
        let reference = if self.points.len() > 1 {
            &self.points[self.points.len() - 2]
        } else {
            latest
        };

        Some(Snapshot {
            ticker: self.ticker.clone(),
            start_date: self.first()?.date,
            end_date: latest.date,
            latest_open: latest.open,
            latest_close: latest.close,
            reference_close: reference.close,
            pct_change: pct_change(reference.close, latest.close),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub latest_open: Option<f64>,
    pub latest_close: f64,
    pub reference_close: f64,
    pub pct_change: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeRange {
    #[default]
    Daily,
    LastFiveDays,
    LastMonth,
    LastYear,
    AllTime,
}

impl TimeRange {
    /// Calendar span in days for date-based ranges; `None` for row-based ones.
    pub fn lookback_days(self) -> Option<i64> {
        match self {
            Self::LastMonth => Some(30),
            Self::LastYear => Some(365),
            Self::Daily | Self::LastFiveDays | Self::AllTime => None,
        }
    }
}

impl FromStr for TimeRange {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "daily" | "dailydefault" | "1d" => Ok(Self::Daily),
            "last5days" | "lastfivedays" | "5d" => Ok(Self::LastFiveDays),
            "lastmonth" | "1m" => Ok(Self::LastMonth),
            "lastyear" | "1y" => Ok(Self::LastYear),
            "alltime" | "all" => Ok(Self::AllTime),
            _ => Err(ParseError::TimeRange(s.to_string())),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Daily => "daily",
            Self::LastFiveDays => "last-five-days",
            Self::LastMonth => "last-month",
            Self::LastYear => "last-year",
            Self::AllTime => "all-time",
        };
        f.write_str(label)
    }
}

/// Percent change from `from` to `to`. `None` when `from` is zero.
pub fn pct_change(from: f64, to: f64) -> Option<f64> {
    if from == 0.0 {
        return None;
    }
    Some((to - from) / from * 100.0)
}

/// Aggregate move of a group of tickers over a range: sum of latest closes against
/// sum of reference closes. The daily view compares with each ticker's previous row when
/// every ticker has one; other ranges compare with the first row in range.
///
/// Calendar ranges share one cutoff taken from the latest date across the whole group,
/// so a ticker whose data stops early contributes only the rows inside that window.
pub fn sector_movement(series: &[PriceSeries], range: TimeRange) -> Option<f64> {
    let group_cutoff = range.lookback_days().and_then(|days| {
        series
            .iter()
            .filter_map(|s| s.last().map(|p| p.date))
            .max()
            .map(|latest| latest - Duration::days(days))
    });

    let filtered: Vec<PriceSeries> = series
        .iter()
        .map(|s| match group_cutoff {
            Some(cutoff) => PriceSeries {
                ticker: s.ticker.clone(),
                points: s.since(cutoff),
            },
            None => s.filter_range(range),
        })
        .filter(|s| !s.is_empty())
        .collect();
    if filtered.is_empty() {
        return None;
    }

    let use_previous = range == TimeRange::Daily && filtered.iter().all(|s| s.len() >= 2);

    let mut latest_sum = 0.0;
    let mut reference_sum = 0.0;
    for s in &filtered {
        let points = s.points();
        latest_sum += points[points.len() - 1].close;
        reference_sum += if use_previous {
            points[points.len() - 2].close
        } else {
            points[0].close
        };
    }

    pct_change(reference_sum, latest_sum)
}
