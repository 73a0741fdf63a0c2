use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::benefits::{PanelSettings, DEFAULT_HOME_CARE_MULTIPLIER, DEFAULT_PREMIUM_PLAN};
use crate::dataset::PreparationOptions;
use crate::savings::{is_valid_discount_rate, DEFAULT_DISCOUNT_RATE};

pub const EXPORT_PATH_ENV: &str = "MEMBERSHIP_EXPORT";
pub const CONFIG_PATH_ENV: &str = "MEMBERSHIP_CONFIG";
pub const DEFAULT_EXPORT_PATH: &str = "membership.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("discount_rate {0} must be within [0, 1)")]
    InvalidDiscountRate(f64),
    #[error("reference_date '{value}' is not a YYYY-MM-DD date: {source}")]
    InvalidReferenceDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("home_care_multiplier must be positive, got {0}")]
    InvalidMultiplier(i64),
}

/// Dashboard settings, read from TOML. Every field is optional.
///
/// ```toml
/// export_path = "exports/membership.csv"
/// discount_rate = 0.2
/// reference_date = "2024-06-30"
/// premium_plan = "Premium"
/// home_care_multiplier = 12
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub export_path: PathBuf,
    pub discount_rate: f64,
    pub reference_date: Option<String>,
    pub premium_plan: String,
    pub home_care_multiplier: i64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
            discount_rate: DEFAULT_DISCOUNT_RATE,
            reference_date: None,
            premium_plan: DEFAULT_PREMIUM_PLAN.to_string(),
            home_care_multiplier: DEFAULT_HOME_CARE_MULTIPLIER,
        }
    }
}

impl DashboardConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_discount_rate(self.discount_rate) {
            return Err(ConfigError::InvalidDiscountRate(self.discount_rate));
        }
        if self.home_care_multiplier <= 0 {
            return Err(ConfigError::InvalidMultiplier(self.home_care_multiplier));
        }
        self.parsed_reference_date()?;
        Ok(())
    }

    fn parsed_reference_date(&self) -> Result<Option<NaiveDate>, ConfigError> {
        self.reference_date
            .as_deref()
            .map(|value| {
                NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|source| {
                    ConfigError::InvalidReferenceDate {
                        value: value.to_string(),
                        source,
                    }
                })
            })
            .transpose()
    }

    /// Midnight of `reference_date` when configured, otherwise `now`.
    pub fn reference_instant(&self, now: NaiveDateTime) -> Result<NaiveDateTime, ConfigError> {
        Ok(self
            .parsed_reference_date()?
            .map(|date| date.and_time(NaiveTime::MIN))
            .unwrap_or(now))
    }

    pub fn preparation_options(&self, now: NaiveDateTime) -> Result<PreparationOptions, ConfigError> {
        self.validate()?;
        Ok(PreparationOptions::new(self.reference_instant(now)?)
            .with_discount_rate(self.discount_rate))
    }

    pub fn panel_settings(&self) -> PanelSettings {
        PanelSettings {
            premium_plan: self.premium_plan.clone(),
            home_care_multiplier: self.home_care_multiplier,
        }
    }
}
