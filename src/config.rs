//! Projection configuration
//!
//! Every field has a default, so a JSON config only needs to name the values it
//! changes. Shock defaults follow the Solvency II standard formula.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::projection::Period;

/// Default last projection period (years)
pub const DEFAULT_HORIZON: Period = 120;

/// Default bound on nested cell evaluations
///
/// Each nested evaluation costs a few native stack frames; 256 levels fit in
/// the 2 MiB stack of a spawned thread. Raise it together with the stack size.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Configuration shared by every run of a projection space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Last period any cell may be evaluated at
    pub horizon: Period,

    /// Maximum nesting of cell evaluations before aborting
    pub max_depth: usize,

    /// Valuation date used to derive policy durations and ages
    pub valuation_date: NaiveDate,

    /// Stress parameters read by the override sets
    pub shock: ShockConfig,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            max_depth: DEFAULT_MAX_DEPTH,
            valuation_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            shock: ShockConfig::default(),
        }
    }
}

impl ProjectionConfig {
    /// Parse a config from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check ranges that would otherwise surface as nonsense projections
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon < 0 {
            return Err(ConfigError::Invalid(format!(
                "horizon must be non-negative, got {}",
                self.horizon
            )));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be positive".to_string()));
        }
        self.shock.validate()
    }
}

/// Stress parameters for the risk-factor override sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShockConfig {
    /// Mortality shock: rates multiplied by (1 + factor)
    pub mort_factor: f64,

    /// Longevity shock: rates multiplied by (1 - factor)
    pub longev_factor: f64,

    /// Mortality and longevity shocks apply only below this attained age
    pub max_age: u32,

    /// Lapse up: rates multiplied by (1 + factor)
    pub lapse_up_factor: f64,

    /// Lapse up: shocked rate is capped here
    pub lapse_up_limit: f64,

    /// Lapse down: rates multiplied by (1 - factor)
    pub lapse_down_factor: f64,

    /// Lapse down: largest absolute decrease
    pub lapse_down_max_decrease: f64,

    /// Mass lapse: share of the in-force surrendering at the shock start
    pub lapse_mass_rate: f64,

    /// Expense shock: maintenance expenses multiplied by (1 + factor)
    pub expense_factor: f64,

    /// Expense shock: added to the inflation rate
    pub expense_infl_add: f64,
}

impl Default for ShockConfig {
    fn default() -> Self {
        Self {
            mort_factor: 0.15,
            longev_factor: 0.20,
            max_age: 120,
            lapse_up_factor: 0.50,
            lapse_up_limit: 1.0,
            lapse_down_factor: 0.50,
            lapse_down_max_decrease: 0.20,
            lapse_mass_rate: 0.40,
            expense_factor: 0.10,
            expense_infl_add: 0.01,
        }
    }
}

impl ShockConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let unit_interval = [
            ("longev_factor", self.longev_factor),
            ("lapse_up_limit", self.lapse_up_limit),
            ("lapse_down_factor", self.lapse_down_factor),
            ("lapse_down_max_decrease", self.lapse_down_max_decrease),
            ("lapse_mass_rate", self.lapse_mass_rate),
        ];
        for (name, value) in unit_interval {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        let non_negative = [
            ("mort_factor", self.mort_factor),
            ("lapse_up_factor", self.lapse_up_factor),
            ("expense_factor", self.expense_factor),
        ];
        for (name, value) in non_negative {
            if value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ProjectionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.horizon, DEFAULT_HORIZON);
        assert_eq!(config.valuation_date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(config.shock.mort_factor, 0.15);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ProjectionConfig::from_json_str(
            r#"{ "horizon": 40, "valuation_date": "2024-12-31", "shock": { "mort_factor": 0.1 } }"#,
        )
        .unwrap();

        assert_eq!(config.horizon, 40);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.valuation_date, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert_eq!(config.shock.mort_factor, 0.1);
        assert_eq!(config.shock.longev_factor, 0.20);
    }

    #[test]
    fn test_rejects_negative_horizon() {
        let result = ProjectionConfig::from_json_str(r#"{ "horizon": -1 }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_out_of_range_shock() {
        let json = r#"{ "shock": { "lapse_mass_rate": 1.5 } }"#;
        let result = ProjectionConfig::from_json_str(json);
        assert!(
            matches!(result, Err(ConfigError::Invalid(msg)) if msg.contains("lapse_mass_rate"))
        );
    }

    #[test]
    fn test_malformed_json() {
        let result = ProjectionConfig::from_json_str("{ horizon: }");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = ProjectionConfig::from_path(Path::new("does/not/exist.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
