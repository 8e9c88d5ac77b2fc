//! Formula sets and override chains
//!
//! A formula set maps cell names to formulas. A run evaluates cells through an
//! ordered chain of sets: the first set that defines a name supplies its
//! formula. Stress scenarios are expressed as small sets placed in front of
//! the base model.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ModelError, ModelResult};
use crate::projection::{Ctx, Period};

type FormulaFn = dyn Fn(&mut Ctx<'_>, Period, &[i64]) -> ModelResult<f64> + Send + Sync;

/// A cell formula: `(ctx, t, extra args) -> value`
#[derive(Clone)]
pub struct Formula(Arc<FormulaFn>);

impl Formula {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Ctx<'_>, Period, &[i64]) -> ModelResult<f64> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, ctx: &mut Ctx<'_>, t: Period, args: &[i64]) -> ModelResult<f64> {
        (self.0)(ctx, t, args)
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formula").finish_non_exhaustive()
    }
}

/// Named table of formulas
#[derive(Debug, Clone)]
pub struct FormulaSet {
    name: String,
    formulas: HashMap<String, Formula>,
}

impl FormulaSet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            formulas: HashMap::new(),
        }
    }

    /// Define a cell indexed by time only
    pub fn with<F>(self, cell: &str, f: F) -> Self
    where
        F: Fn(&mut Ctx<'_>, Period) -> ModelResult<f64> + Send + Sync + 'static,
    {
        self.with_args(cell, move |ctx, t, _args| f(ctx, t))
    }

    /// Define a cell that takes extra integer arguments
    pub fn with_args<F>(mut self, cell: &str, f: F) -> Self
    where
        F: Fn(&mut Ctx<'_>, Period, &[i64]) -> ModelResult<f64> + Send + Sync + 'static,
    {
        self.formulas.insert(cell.to_string(), Formula::new(f));
        self
    }

    /// Define a cell with the same value at every period
    pub fn constant(self, cell: &str, value: f64) -> Self {
        self.with(cell, move |_, _| Ok(value))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, cell: &str) -> Option<&Formula> {
        self.formulas.get(cell)
    }

    pub fn defines(&self, cell: &str) -> bool {
        self.formulas.contains_key(cell)
    }

    /// Cell names defined by this set, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.formulas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }
}

/// Ordered formula sets; earlier sets override later ones
#[derive(Debug, Clone, Default)]
pub struct OverrideChain {
    sets: Vec<Arc<FormulaSet>>,
}

impl OverrideChain {
    pub fn new(sets: Vec<Arc<FormulaSet>>) -> Self {
        Self { sets }
    }

    /// Copy of this chain with `set` taking precedence over everything in it
    pub fn with_front(&self, set: Arc<FormulaSet>) -> Self {
        let mut sets = Vec::with_capacity(self.sets.len() + 1);
        sets.push(set);
        sets.extend(self.sets.iter().cloned());
        Self { sets }
    }

    pub fn set_names(&self) -> Vec<&str> {
        self.sets.iter().map(|set| set.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// First definition of `quantity` at or below `start_level`
    pub fn resolve_from(&self, quantity: &str, start_level: usize) -> Option<Resolved<'_>> {
        self.sets
            .iter()
            .enumerate()
            .skip(start_level)
            .find_map(|(level, set)| {
                set.get(quantity).map(|formula| Resolved {
                    level,
                    set: set.as_ref(),
                    formula,
                })
            })
    }
}

/// Where a quantity was found in a chain
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'c> {
    /// Position of the defining set in the chain (0 = front)
    pub level: usize,
    pub set: &'c FormulaSet,
    pub formula: &'c Formula,
}

impl Resolved<'_> {
    pub fn set_name(&self) -> &str {
        self.set.name()
    }
}

/// Find the formula that supplies `quantity` under `chain`
pub fn resolve<'c>(quantity: &str, chain: &'c OverrideChain) -> ModelResult<Resolved<'c>> {
    chain
        .resolve_from(quantity, 0)
        .ok_or_else(|| ModelError::NoFormulaFound {
            quantity: quantity.to_string(),
            chain: chain.set_names().join(" > "),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> OverrideChain {
        let base = FormulaSet::new("base")
            .constant("MortRateFactor", 1.0)
            .constant("SurrRate", 0.05)
            .constant("DiscRate", 0.03);
        let lapse = FormulaSet::new("lapse_up").constant("SurrRate", 0.06);
        let mort = FormulaSet::new("mort").constant("MortRateFactor", 1.15);

        OverrideChain::new(vec![Arc::new(base)])
            .with_front(Arc::new(lapse))
            .with_front(Arc::new(mort))
    }

    #[test]
    fn test_first_definition_wins() {
        let chain = chain();
        assert_eq!(chain.set_names(), vec!["mort", "lapse_up", "base"]);

        let resolved = resolve("SurrRate", &chain).unwrap();
        assert_eq!(resolved.set_name(), "lapse_up");
        assert_eq!(resolved.level, 1);

        let resolved = resolve("DiscRate", &chain).unwrap();
        assert_eq!(resolved.set_name(), "base");
        assert_eq!(resolved.level, 2);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let chain = chain();
        let first: Vec<usize> = ["MortRateFactor", "SurrRate", "DiscRate"]
            .iter()
            .map(|q| resolve(q, &chain).unwrap().level)
            .collect();
        for _ in 0..10 {
            let again: Vec<usize> = ["MortRateFactor", "SurrRate", "DiscRate"]
                .iter()
                .map(|q| resolve(q, &chain).unwrap().level)
                .collect();
            assert_eq!(again, first);
        }
    }

    #[test]
    fn test_resolve_from_skips_front_sets() {
        let chain = chain();
        let resolved = chain.resolve_from("SurrRate", 2).unwrap();
        assert_eq!(resolved.set_name(), "base");
        assert!(chain.resolve_from("MortRateFactor", 3).is_none());
    }

    #[test]
    fn test_chain_order_decides_shared_quantities() {
        let a = Arc::new(
            FormulaSet::new("a")
                .constant("Shared", 1.0)
                .constant("OnlyA", 2.0),
        );
        let b = Arc::new(FormulaSet::new("b").constant("Shared", 3.0));
        let base = Arc::new(FormulaSet::new("base").constant("DiscRate", 0.03));
        let a_first = OverrideChain::new(vec![a.clone(), b.clone(), base.clone()]);
        let b_first = OverrideChain::new(vec![b, a, base]);

        assert_eq!(resolve("Shared", &a_first).unwrap().set_name(), "a");
        assert_eq!(resolve("Shared", &b_first).unwrap().set_name(), "b");

        // Quantities defined once resolve to the same set whatever the order
        for chain in [&a_first, &b_first] {
            assert_eq!(resolve("OnlyA", chain).unwrap().set_name(), "a");
            assert_eq!(resolve("DiscRate", chain).unwrap().set_name(), "base");
            assert_eq!(resolve("DiscRate", chain).unwrap().level, 2);
        }
        assert_eq!(resolve("OnlyA", &a_first).unwrap().level, 0);
        assert_eq!(resolve("OnlyA", &b_first).unwrap().level, 1);
    }

    #[test]
    fn test_missing_quantity() {
        let chain = chain();
        let err = resolve("PremIncome", &chain).unwrap_err();
        assert_eq!(
            err,
            ModelError::NoFormulaFound {
                quantity: "PremIncome".to_string(),
                chain: "mort > lapse_up > base".to_string(),
            }
        );
    }

    #[test]
    fn test_set_names_sorted() {
        let set = FormulaSet::new("base").constant("b", 1.0).constant("a", 2.0);
        assert_eq!(set.names(), vec!["a", "b"]);
        assert!(set.defines("a"));
        assert!(!set.defines("c"));
        assert_eq!(set.len(), 2);
    }
}
