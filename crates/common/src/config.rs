use std::path::PathBuf;

use tracing::warn;

use crate::models::RiskProfile;

pub const DEFAULT_PRICES_CSV: &str = "data/processed/de_share_prices_processed.csv";
pub const DEFAULT_MODELS_DIR: &str = "models";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub prices_csv: PathBuf,
    pub models_dir: PathBuf,
    pub risk_profile: RiskProfile,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prices_csv: PathBuf::from(DEFAULT_PRICES_CSV),
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            risk_profile: RiskProfile::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(path) = lookup("PRICES_CSV") {
            settings.prices_csv = PathBuf::from(path);
        }
        if let Some(dir) = lookup("MODELS_DIR") {
            settings.models_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("RISK_PROFILE") {
            match raw.parse() {
                Ok(profile) => settings.risk_profile = profile,
                Err(e) => warn!("Ignoring RISK_PROFILE: {}", e),
            }
        }

        settings
    }
}
