//! Policy point data structures

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Gender of the insured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

/// One row of in-force business (a policy or a model point)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyPoint {
    /// Unique policy identifier
    pub policy_id: u32,

    /// Product code, used as the first assumption lookup key
    pub product: String,

    /// Plan (policy type) code within the product
    pub plan: String,

    /// Assumption generation, if the product has more than one
    #[serde(default)]
    pub generation: Option<u32>,

    /// Policy entry (issue) date
    pub entry_date: NaiveDate,

    /// Age at entry
    pub entry_age: u32,

    /// Gender of the insured
    pub gender: Gender,

    /// Policy term in years
    pub policy_term: u32,

    /// Number of policies represented (fractional for model points)
    pub count: f64,

    /// Sum assured per policy
    pub sum_assured: f64,

    /// Annual premium per policy
    pub annual_premium: f64,
}

impl PolicyPoint {
    /// Create a policy point with no assumption generation
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        policy_id: u32,
        product: &str,
        plan: &str,
        entry_date: NaiveDate,
        entry_age: u32,
        gender: Gender,
        policy_term: u32,
        count: f64,
        sum_assured: f64,
        annual_premium: f64,
    ) -> Self {
        Self {
            policy_id,
            product: product.to_string(),
            plan: plan.to_string(),
            generation: None,
            entry_date,
            entry_age,
            gender,
            policy_term,
            count,
            sum_assured,
            annual_premium,
        }
    }

    /// Set the assumption generation
    pub fn with_generation(mut self, generation: u32) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Completed policy years at the valuation date
    pub fn duration_at(&self, valuation_date: NaiveDate) -> u32 {
        if valuation_date <= self.entry_date {
            return 0;
        }

        let mut years = valuation_date.year() - self.entry_date.year();
        let before_anniversary = (valuation_date.month(), valuation_date.day())
            < (self.entry_date.month(), self.entry_date.day());
        if before_anniversary {
            years -= 1;
        }

        u32::try_from(years).unwrap_or(0)
    }

    /// Attained age at the valuation date
    pub fn attained_age_at(&self, valuation_date: NaiveDate) -> u32 {
        self.entry_age + self.duration_at(valuation_date)
    }

    /// Years left until maturity at the valuation date (0 once matured)
    pub fn remaining_term(&self, valuation_date: NaiveDate) -> u32 {
        self.policy_term.saturating_sub(self.duration_at(valuation_date))
    }
}

/// Policy points indexed by id
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    points: Vec<PolicyPoint>,
    index: HashMap<u32, usize>,
}

impl PolicyTable {
    /// Build a table, rejecting duplicate ids
    pub fn from_points(points: Vec<PolicyPoint>) -> ModelResult<Self> {
        let mut index = HashMap::with_capacity(points.len());
        for (position, point) in points.iter().enumerate() {
            if index.insert(point.policy_id, position).is_some() {
                return Err(ModelError::DuplicatePolicy(point.policy_id));
            }
        }
        Ok(Self { points, index })
    }

    /// Look up a policy point by id
    pub fn get(&self, policy_id: u32) -> Option<&PolicyPoint> {
        self.index.get(&policy_id).map(|&i| &self.points[i])
    }

    /// Policy ids in load order
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.points.iter().map(|p| p.policy_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PolicyPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
