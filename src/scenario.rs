//! Economic scenarios: annual interest and inflation curves keyed by scenario id

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::projection::Period;

/// Interest and inflation rates by projection year for one scenario
///
/// Rates past the end of a curve repeat the last value; an empty curve is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioCurve {
    pub scen_id: u32,

    /// Annual interest (discount) rate for year t
    pub interest: Vec<f64>,

    /// Annual inflation rate for year t
    pub inflation: Vec<f64>,
}

impl ScenarioCurve {
    pub fn new(scen_id: u32, interest: Vec<f64>, inflation: Vec<f64>) -> Self {
        Self {
            scen_id,
            interest,
            inflation,
        }
    }

    /// Constant rates for every year
    pub fn flat(scen_id: u32, interest: f64, inflation: f64) -> Self {
        Self::new(scen_id, vec![interest], vec![inflation])
    }

    pub fn interest_rate(&self, t: Period) -> f64 {
        rate_at(&self.interest, t)
    }

    pub fn inflation_rate(&self, t: Period) -> f64 {
        rate_at(&self.inflation, t)
    }

    /// Discount factor from time 0 to time t, compounding the yearly rates
    pub fn discount_factor(&self, t: Period) -> f64 {
        (0..t.max(0)).fold(1.0, |factor, s| factor / (1.0 + self.interest_rate(s)))
    }
}

fn rate_at(curve: &[f64], t: Period) -> f64 {
    let index = usize::try_from(t).unwrap_or(0);
    curve
        .get(index)
        .or_else(|| curve.last())
        .copied()
        .unwrap_or(0.0)
}

/// All scenario curves, keyed by scenario id
#[derive(Debug, Clone, Default)]
pub struct ScenarioSet {
    curves: BTreeMap<u32, ScenarioCurve>,
}

impl ScenarioSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_curves(curves: Vec<ScenarioCurve>) -> Self {
        Self {
            curves: curves.into_iter().map(|c| (c.scen_id, c)).collect(),
        }
    }

    /// Add or replace a scenario
    pub fn insert(&mut self, curve: ScenarioCurve) {
        self.curves.insert(curve.scen_id, curve);
    }

    pub fn get(&self, scen_id: u32) -> Option<&ScenarioCurve> {
        self.curves.get(&scen_id)
    }

    /// Scenario ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.curves.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_extrapolation() {
        let curve = ScenarioCurve::new(1, vec![0.01, 0.02, 0.03], vec![0.02]);

        assert_eq!(curve.interest_rate(0), 0.01);
        assert_eq!(curve.interest_rate(2), 0.03);
        assert_eq!(curve.interest_rate(40), 0.03);
        assert_eq!(curve.inflation_rate(10), 0.02);
    }

    #[test]
    fn test_empty_curve_is_zero() {
        let curve = ScenarioCurve::new(1, Vec::new(), Vec::new());
        assert_eq!(curve.interest_rate(5), 0.0);
        assert_eq!(curve.discount_factor(5), 1.0);
    }

    #[test]
    fn test_discount_factor() {
        let curve = ScenarioCurve::flat(1, 0.03, 0.0);

        assert_eq!(curve.discount_factor(0), 1.0);
        assert_relative_eq!(curve.discount_factor(10), 1.03_f64.powi(-10), epsilon = 1e-12);
    }

    #[test]
    fn test_scenario_set() {
        let set = ScenarioSet::from_curves(vec![
            ScenarioCurve::flat(2, 0.05, 0.02),
            ScenarioCurve::flat(1, 0.03, 0.02),
        ]);

        assert_eq!(set.len(), 2);
        assert_eq!(set.ids().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(set.get(2).map(|c| c.interest_rate(0)), Some(0.05));
        assert!(set.get(3).is_none());
    }
}
