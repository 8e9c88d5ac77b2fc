//! Risk factors and the shock arithmetic used by the stress override sets

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ShockConfig;
use crate::error::ModelError;
use crate::projection::Period;

/// Lapse stress direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LapseShock {
    Up,
    Down,
    Mass,
}

/// Risk factor a run is projected under
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Risk {
    /// Unshocked best estimate
    #[default]
    Base,
    Mortality,
    Longevity,
    Lapse(LapseShock),
    Expense,
}

impl Risk {
    /// Every stress the standard model knows about, base excluded
    pub const STRESSES: [Risk; 6] = [
        Risk::Mortality,
        Risk::Longevity,
        Risk::Lapse(LapseShock::Up),
        Risk::Lapse(LapseShock::Down),
        Risk::Lapse(LapseShock::Mass),
        Risk::Expense,
    ];

    /// Short label, also accepted by `FromStr`
    pub fn label(&self) -> &'static str {
        match self {
            Risk::Base => "base",
            Risk::Mortality => "mort",
            Risk::Longevity => "longev",
            Risk::Lapse(LapseShock::Up) => "lapse_up",
            Risk::Lapse(LapseShock::Down) => "lapse_down",
            Risk::Lapse(LapseShock::Mass) => "lapse_mass",
            Risk::Expense => "exps",
        }
    }
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Risk {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base" => Ok(Risk::Base),
            "mort" => Ok(Risk::Mortality),
            "longev" => Ok(Risk::Longevity),
            "lapse_up" => Ok(Risk::Lapse(LapseShock::Up)),
            "lapse_down" => Ok(Risk::Lapse(LapseShock::Down)),
            "lapse_mass" => Ok(Risk::Lapse(LapseShock::Mass)),
            "exps" => Ok(Risk::Expense),
            other => Err(ModelError::InvalidConfig(format!("unknown risk '{}'", other))),
        }
    }
}

/// Multiplier applied to mortality rates at time t
///
/// Only the mortality and longevity stresses move it, and only from the shock
/// start while the attained age is below `max_age`.
pub fn mortality_factor(
    risk: Risk,
    t: Period,
    shock_start: Period,
    attained_age: u32,
    shock: &ShockConfig,
) -> f64 {
    if t < shock_start || attained_age >= shock.max_age {
        return 1.0;
    }
    match risk {
        Risk::Mortality => 1.0 + shock.mort_factor,
        Risk::Longevity => 1.0 - shock.longev_factor,
        _ => 1.0,
    }
}

/// Lapse up: rate scaled up, capped at `limit`
pub fn lapse_up_rate(base: f64, factor: f64, limit: f64) -> f64 {
    (base * (1.0 + factor)).min(limit)
}

/// Lapse down: rate scaled down by at most `max_decrease` in absolute terms
pub fn lapse_down_rate(base: f64, factor: f64, max_decrease: f64) -> f64 {
    base - (base * factor).min(max_decrease)
}

/// Mass lapse: a share of the policies left after normal lapses also surrender
pub fn mass_lapse_rate(base: f64, mass_rate: f64) -> f64 {
    base + (1.0 - base) * mass_rate
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn shock() -> ShockConfig {
        ShockConfig {
            mort_factor: 0.10,
            ..ShockConfig::default()
        }
    }

    #[test]
    fn test_mortality_factor_from_shock_start() {
        let shock = shock();
        assert_eq!(mortality_factor(Risk::Mortality, 4, 5, 45, &shock), 1.0);
        assert_relative_eq!(mortality_factor(Risk::Mortality, 5, 5, 45, &shock), 1.10);
        assert_relative_eq!(mortality_factor(Risk::Mortality, 30, 5, 75, &shock), 1.10);
    }

    #[test]
    fn test_mortality_factor_stops_at_max_age() {
        let shock = ShockConfig {
            max_age: 48,
            ..shock()
        };
        assert_relative_eq!(mortality_factor(Risk::Mortality, 2, 2, 47, &shock), 1.10);
        assert_eq!(mortality_factor(Risk::Mortality, 3, 2, 48, &shock), 1.0);
    }

    #[test]
    fn test_longevity_and_other_risks() {
        let shock = ShockConfig::default();
        assert_relative_eq!(mortality_factor(Risk::Longevity, 0, 0, 60, &shock), 0.80);
        assert_eq!(mortality_factor(Risk::Base, 10, 0, 60, &shock), 1.0);
        assert_eq!(mortality_factor(Risk::Expense, 10, 0, 60, &shock), 1.0);
    }

    #[test]
    fn test_lapse_rates() {
        assert_relative_eq!(lapse_up_rate(0.05, 0.2, 0.08), 0.06);
        assert_relative_eq!(lapse_up_rate(0.05, 1.0, 0.08), 0.08);
        assert_relative_eq!(lapse_down_rate(0.10, 0.5, 0.2), 0.05);
        assert_relative_eq!(lapse_down_rate(0.60, 0.5, 0.2), 0.40);
        assert_relative_eq!(mass_lapse_rate(0.05, 0.4), 0.43);
    }

    #[test]
    fn test_labels_round_trip() {
        for risk in std::iter::once(Risk::Base).chain(Risk::STRESSES) {
            assert_eq!(risk.label().parse::<Risk>(), Ok(risk));
        }
        assert!(matches!("pandemic".parse::<Risk>(), Err(ModelError::InvalidConfig(_))));
    }
}
