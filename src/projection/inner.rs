//! Inner projections launched from an outer run at a re-projection time
//!
//! An inner run shares the outer run's time axis. Periods before `t0` are
//! answered by the outer run, the model's boundary cells at `t0` are copied
//! from it, and everything else is projected afresh under the inner chain.

use std::sync::Arc;

use crate::error::ModelResult;
use crate::projection::{FormulaSet, Period, ProjectionSpace, Risk, RunId};

/// How an inner run differs from its outer run
#[derive(Debug, Clone)]
pub struct InnerSpec {
    pub t0: Period,

    /// `None` keeps the outer run's chain and shock start; `Some` switches to
    /// the model's chain for that risk with the shock starting at `t0`
    pub risk: Option<Risk>,

    /// Formula set placed in front of the chain
    pub overlay: Option<Arc<FormulaSet>>,
}

impl InnerSpec {
    pub fn at(t0: Period) -> Self {
        Self {
            t0,
            risk: None,
            overlay: None,
        }
    }

    pub fn with_risk(mut self, risk: Risk) -> Self {
        self.risk = Some(risk);
        self
    }

    pub fn with_overlay(self, overlay: FormulaSet) -> Self {
        self.with_shared_overlay(Arc::new(overlay))
    }

    /// Overlay given as a shared set; reusing the same `Arc` reuses the inner run
    pub fn with_shared_overlay(mut self, overlay: Arc<FormulaSet>) -> Self {
        self.overlay = Some(overlay);
        self
    }
}

/// Handle to an inner run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InnerProjection {
    run: RunId,
    outer: RunId,
    t0: Period,
}

impl InnerProjection {
    pub(crate) fn new(run: RunId, outer: RunId, t0: Period) -> Self {
        Self { run, outer, t0 }
    }

    pub fn run(&self) -> RunId {
        self.run
    }

    pub fn outer(&self) -> RunId {
        self.outer
    }

    pub fn t0(&self) -> Period {
        self.t0
    }

    /// Value `k` periods after the re-projection time
    pub fn value_at(&self, space: &mut ProjectionSpace, cell: &str, k: Period) -> ModelResult<f64> {
        space.evaluate(self.run, cell, self.t0 + k)
    }
}
