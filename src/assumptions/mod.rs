//! Actuarial assumptions: scoped values plus mortality and lapse tables
//!
//! Values are scoped by (product, plan, generation). A lookup starts with the
//! most specific scope and widens one key at a time:
//!
//! `(product, plan, gen) -> (product, plan, *) -> (product, *, *) -> (*, *, *)`
//!
//! A miss after the widest scope is a normal outcome (`None`), not an error.

mod lapse;
mod mortality;

pub use lapse::LapseTable;
pub use mortality::MortalityTable;

use std::collections::HashMap;

use log::trace;
use serde::{Deserialize, Serialize};

/// A single assumption value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssumptionValue {
    /// Scalar (factor, rate, per-policy amount)
    Number(f64),
    /// Id of a registered mortality or lapse table
    Table(String),
}

impl AssumptionValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AssumptionValue::Number(value) => Some(*value),
            AssumptionValue::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&str> {
        match self {
            AssumptionValue::Table(id) => Some(id),
            AssumptionValue::Number(_) => None,
        }
    }
}

/// Scope of a value; `None` matches any key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Scope {
    product: Option<String>,
    plan: Option<String>,
    generation: Option<u32>,
}

impl Scope {
    fn matches(&self, product: Option<&str>, plan: Option<&str>, generation: Option<u32>) -> bool {
        self.product.as_deref() == product
            && self.plan.as_deref() == plan
            && self.generation == generation
    }
}

/// Container for all assumption values and tables
#[derive(Debug, Clone, Default)]
pub struct AssumptionSet {
    entries: HashMap<String, Vec<(Scope, AssumptionValue)>>,
    mortality_tables: HashMap<String, MortalityTable>,
    lapse_tables: HashMap<String, LapseTable>,
}

impl AssumptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value for a scope, replacing any value already in that exact scope
    pub fn insert(
        &mut self,
        name: &str,
        product: Option<&str>,
        plan: Option<&str>,
        generation: Option<u32>,
        value: AssumptionValue,
    ) {
        let scoped = self.entries.entry(name.to_string()).or_default();
        match scoped
            .iter()
            .position(|(scope, _)| scope.matches(product, plan, generation))
        {
            Some(position) => scoped[position].1 = value,
            None => scoped.push((
                Scope {
                    product: product.map(str::to_string),
                    plan: plan.map(str::to_string),
                    generation,
                },
                value,
            )),
        }
    }

    /// Set a value that applies to every product
    pub fn set_number(&mut self, name: &str, value: f64) {
        self.insert(name, None, None, None, AssumptionValue::Number(value));
    }

    /// Point an assumption at a table for every product
    pub fn set_table(&mut self, name: &str, table_id: &str) {
        self.insert(name, None, None, None, AssumptionValue::Table(table_id.to_string()));
    }

    pub fn add_mortality_table(&mut self, id: &str, table: MortalityTable) {
        self.mortality_tables.insert(id.to_string(), table);
    }

    pub fn add_lapse_table(&mut self, id: &str, table: LapseTable) {
        self.lapse_tables.insert(id.to_string(), table);
    }

    /// Look up a value, widening the scope until something matches
    pub fn lookup(
        &self,
        name: &str,
        product: Option<&str>,
        plan: Option<&str>,
        generation: Option<u32>,
    ) -> Option<&AssumptionValue> {
        let scoped = self.entries.get(name)?;

        let mut candidates = vec![
            (product, plan, generation),
            (product, plan, None),
            (product, None, None),
            (None, None, None),
        ];
        candidates.dedup();

        for (level, (prod, pl, gen_key)) in candidates.into_iter().enumerate() {
            let found = scoped.iter().find(|(scope, _)| scope.matches(prod, pl, gen_key));
            if let Some((_, value)) = found {
                if level > 0 {
                    trace!("Assumption '{}' resolved after widening {} level(s)", name, level);
                }
                return Some(value);
            }
        }

        None
    }

    /// Numeric value, if the lookup finds a number
    pub fn number(
        &self,
        name: &str,
        product: Option<&str>,
        plan: Option<&str>,
        generation: Option<u32>,
    ) -> Option<f64> {
        self.lookup(name, product, plan, generation)
            .and_then(AssumptionValue::as_number)
    }

    pub fn mortality_table(&self, id: &str) -> Option<&MortalityTable> {
        self.mortality_tables.get(id)
    }

    pub fn lapse_table(&self, id: &str) -> Option<&LapseTable> {
        self.lapse_tables.get(id)
    }
}
