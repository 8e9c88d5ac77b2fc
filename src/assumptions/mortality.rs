//! Annual mortality tables with optional mortality improvement
//!
//! The table separates:
//! - Base annual rates by age and gender
//! - Annual improvement rates by age and gender, applied from a base year
//!
//! Ages past the end of the table are treated as certain death.

use serde::{Deserialize, Serialize};

use crate::policy::Gender;

/// Mortality table keyed by attained age
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortalityTable {
    /// Base annual mortality rates by age (index = age)
    /// Stored as (female_rate, male_rate)
    base_rates: Vec<(f64, f64)>,

    /// Annual improvement rates by age, stored as (female_rate, male_rate)
    improvement_rates: Option<Vec<(f64, f64)>>,

    /// Calendar year the base rates refer to
    base_year: i32,
}

impl MortalityTable {
    /// Create a table without improvement
    pub fn new(base_rates: Vec<(f64, f64)>) -> Self {
        Self {
            base_rates,
            improvement_rates: None,
            base_year: 0,
        }
    }

    /// Same rate for every age up to `max_age` and both genders
    pub fn flat(rate: f64, max_age: u32) -> Self {
        Self::new(vec![(rate, rate); max_age as usize + 1])
    }

    /// Gompertz-Makeham rates `a + b * c^age`, capped at 1
    ///
    /// Female rates use the same curve shifted `female_offset` years younger.
    pub fn gompertz_makeham(a: f64, b: f64, c: f64, female_offset: u32, max_age: u32) -> Self {
        let rate = |age: f64| (a + b * c.powf(age)).min(1.0);
        let base_rates = (0..=max_age)
            .map(|age| {
                let male = rate(age as f64);
                let female = rate(age.saturating_sub(female_offset) as f64);
                (female, male)
            })
            .collect();
        Self::new(base_rates)
    }

    /// Attach improvement rates applied from `base_year`
    pub fn with_improvement(mut self, improvement_rates: Vec<(f64, f64)>, base_year: i32) -> Self {
        self.improvement_rates = Some(improvement_rates);
        self.base_year = base_year;
        self
    }

    /// Oldest age with a tabulated rate
    pub fn max_age(&self) -> u32 {
        self.base_rates.len().saturating_sub(1) as u32
    }

    /// Raw base rate before improvement
    pub fn base_rate(&self, age: u32, gender: Gender) -> f64 {
        match self.base_rates.get(age as usize) {
            Some(&(female, male)) => match gender {
                Gender::Female => female,
                Gender::Male => male,
            },
            None => 1.0,
        }
    }

    /// Improvement rate for a specific age and gender
    pub fn improvement_rate(&self, age: u32, gender: Gender) -> f64 {
        let Some(rates) = &self.improvement_rates else {
            return 0.0;
        };
        match rates.get(age as usize) {
            Some(&(female, male)) => match gender {
                Gender::Female => female,
                Gender::Male => male,
            },
            None => 0.0,
        }
    }

    /// Annual mortality rate in a calendar year
    ///
    /// Uses `base * (1 - improvement)^(year - base_year)`; years before the
    /// base year get no improvement.
    pub fn annual_rate(&self, age: u32, gender: Gender, calendar_year: i32) -> f64 {
        let base = self.base_rate(age, gender);
        if self.improvement_rates.is_none() {
            return base;
        }

        let years = (calendar_year - self.base_year).max(0);
        let improvement = self.improvement_rate(age, gender);
        base * (1.0 - improvement).powi(years)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_table() {
        let table = MortalityTable::flat(0.01, 110);

        assert_eq!(table.max_age(), 110);
        assert_eq!(table.annual_rate(45, Gender::Male, 2030), 0.01);
        assert_eq!(table.annual_rate(45, Gender::Female, 2030), 0.01);
    }

    #[test]
    fn test_beyond_table_is_certain_death() {
        let table = MortalityTable::flat(0.01, 100);
        assert_eq!(table.base_rate(101, Gender::Male), 1.0);
    }

    #[test]
    fn test_improvement_reduces_rates() {
        let table = MortalityTable::flat(0.02, 110)
            .with_improvement(vec![(0.01, 0.015); 111], 2020);

        // 5 years of 1.5% male improvement
        let expected = 0.02 * 0.985_f64.powi(5);
        assert_relative_eq!(table.annual_rate(60, Gender::Male, 2025), expected, epsilon = 1e-15);

        // No improvement before the base year
        assert_eq!(table.annual_rate(60, Gender::Male, 2018), 0.02);
    }

    #[test]
    fn test_gompertz_makeham_shape() {
        let table = MortalityTable::gompertz_makeham(0.0005, 0.00003, 1.1, 3, 120);

        assert!(table.base_rate(80, Gender::Male) > table.base_rate(40, Gender::Male));
        assert!(table.base_rate(60, Gender::Female) < table.base_rate(60, Gender::Male));
        assert!(table.base_rate(120, Gender::Male) <= 1.0);
    }
}
