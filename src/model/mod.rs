//! Model definitions: a base formula set plus override sets per risk factor
//!
//! `ModelDef::term_life()` is the standard annual term-life model with the six
//! standard-formula stresses registered.

mod base;
pub mod cells;
mod stress;

pub use base::BASE_SET;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::projection::{FormulaSet, LapseShock, OverrideChain, Risk};

/// Immutable model definition shared by every run of a space
#[derive(Debug, Clone)]
pub struct ModelDef {
    name: String,
    base: Arc<FormulaSet>,
    overrides: HashMap<Risk, Vec<Arc<FormulaSet>>>,
    /// Cells copied from the outer run at a re-projection time
    boundary: BTreeSet<String>,
}

impl ModelDef {
    pub fn new(name: &str, base: FormulaSet) -> Self {
        Self {
            name: name.to_string(),
            base: Arc::new(base),
            overrides: HashMap::new(),
            boundary: BTreeSet::new(),
        }
    }

    /// Annual term-life model with all standard stresses
    pub fn term_life() -> Self {
        Self::new("term_life", base::term_life())
            .with_override(Risk::Mortality, stress::mortality())
            .with_override(Risk::Longevity, stress::longevity())
            .with_override(Risk::Lapse(LapseShock::Up), stress::lapse_up())
            .with_override(Risk::Lapse(LapseShock::Down), stress::lapse_down())
            .with_override(Risk::Lapse(LapseShock::Mass), stress::lapse_mass())
            .with_override(Risk::Expense, stress::expense())
            .with_boundary(&cells::BOUNDARY)
    }

    /// Register an override set for a risk; sets added later take precedence
    pub fn with_override(mut self, risk: Risk, set: FormulaSet) -> Self {
        self.overrides.entry(risk).or_default().insert(0, Arc::new(set));
        self
    }

    /// Declare state cells copied from the outer run at a re-projection time
    pub fn with_boundary(mut self, cells: &[&str]) -> Self {
        self.boundary.extend(cells.iter().map(|cell| cell.to_string()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> &FormulaSet {
        &self.base
    }

    /// Override chain for a risk: its override sets, then the base set
    pub fn chain_for(&self, risk: Risk) -> OverrideChain {
        let mut sets: Vec<Arc<FormulaSet>> = self.overrides.get(&risk).cloned().unwrap_or_default();
        sets.push(self.base.clone());
        OverrideChain::new(sets)
    }

    pub fn is_boundary(&self, cell: &str) -> bool {
        self.boundary.contains(cell)
    }

    /// Risks with at least one override set
    pub fn risks(&self) -> Vec<Risk> {
        Risk::STRESSES
            .into_iter()
            .filter(|risk| self.overrides.contains_key(risk))
            .collect()
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_for_base_is_base_only() {
        let model = ModelDef::term_life();
        assert_eq!(model.chain_for(Risk::Base).set_names(), vec![BASE_SET]);
    }

    #[test]
    fn test_chain_for_stress() {
        let model = ModelDef::term_life();
        assert_eq!(
            model.chain_for(Risk::Lapse(LapseShock::Up)).set_names(),
            vec!["lapse_up", BASE_SET]
        );
        assert_eq!(model.risks().len(), 6);
    }

    #[test]
    fn test_later_override_takes_precedence() {
        let model = ModelDef::new("m", FormulaSet::new("base").constant("X", 1.0))
            .with_override(Risk::Expense, FormulaSet::new("first").constant("X", 2.0))
            .with_override(Risk::Expense, FormulaSet::new("second").constant("X", 3.0));

        assert_eq!(
            model.chain_for(Risk::Expense).set_names(),
            vec!["second", "first", "base"]
        );
    }

    #[test]
    fn test_boundary_cells() {
        let model = ModelDef::term_life();
        assert!(model.is_boundary(cells::POLS_IF_END));
        assert!(model.is_boundary(cells::DISC_FACTOR));
        assert!(!model.is_boundary(cells::BEL));
        assert!(!ModelDef::new("m", FormulaSet::new("base")).is_boundary(cells::POLS_IF_END));
    }
}
