use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sector {
    Pharmaceutical,
    Automotive,
}

impl Sector {
    pub fn tickers(&self) -> &'static [&'static str] {
        match self {
            Self::Pharmaceutical => &["BAYN.DE", "FRE.DE"],
            Self::Automotive => &["MBG.DE", "BMW.DE", "VOW.DE"],
        }
    }
}

impl FromStr for Sector {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pharmaceutical" | "pharma" => Ok(Self::Pharmaceutical),
            "automotive" | "auto" => Ok(Self::Automotive),
            _ => Err(ParseError::Sector(s.to_string())),
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pharmaceutical => f.write_str("Pharmaceutical"),
            Self::Automotive => f.write_str("Automotive"),
        }
    }
}
