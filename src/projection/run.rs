//! Projection runs: one memoized instance of the model per run key
//!
//! A run is bound to one policy, one scenario and one risk factor. It owns its
//! cell cache exclusively, so two runs never see each other's values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::projection::cell::{CacheStats, CellCache, CellKey};
use crate::projection::{OverrideChain, Period, Risk};

/// Handle to a run inside a `ProjectionSpace`
///
/// Handles are never reused, so a handle to a discarded run stays stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(pub(crate) usize);

impl RunId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Parameters identifying a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunKey {
    pub policy_id: u32,
    pub scen_id: u32,
    pub risk: Risk,

    /// First period the risk's shock applies to
    pub shock_start: Period,
}

impl RunKey {
    /// Unshocked run
    pub fn new(policy_id: u32, scen_id: u32) -> Self {
        Self {
            policy_id,
            scen_id,
            risk: Risk::Base,
            shock_start: 0,
        }
    }

    pub fn with_risk(mut self, risk: Risk, shock_start: Period) -> Self {
        self.risk = risk;
        self.shock_start = shock_start;
        self
    }

    pub fn label(&self) -> String {
        match self.risk {
            Risk::Base => format!("policy {} / scen {}", self.policy_id, self.scen_id),
            risk => format!(
                "policy {} / scen {} / {}@{}",
                self.policy_id, self.scen_id, risk, self.shock_start
            ),
        }
    }
}

/// Link from an inner run to the run and period it was launched from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OuterLink {
    pub run: RunId,
    pub t0: Period,
}

/// One instance of the model
#[derive(Debug)]
pub struct ProjectionRun {
    pub(crate) id: RunId,
    pub(crate) key: RunKey,
    pub(crate) chain: OverrideChain,
    pub(crate) outer: Option<OuterLink>,
    /// Last period with business in force
    pub(crate) last_t: Period,
    pub(crate) cache: CellCache,
}

impl ProjectionRun {
    pub(crate) fn new(
        id: RunId,
        key: RunKey,
        chain: OverrideChain,
        outer: Option<OuterLink>,
        last_t: Period,
    ) -> Self {
        Self {
            id,
            key,
            chain,
            outer,
            last_t,
            cache: CellCache::new(),
        }
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn key(&self) -> RunKey {
        self.key
    }

    pub fn chain(&self) -> &OverrideChain {
        &self.chain
    }

    /// Run this inner run was launched from
    pub fn outer_run(&self) -> Option<RunId> {
        self.outer.map(|link| link.run)
    }

    /// Period an inner run branches off its outer run
    pub fn reprojection_time(&self) -> Option<Period> {
        self.outer.map(|link| link.t0)
    }

    pub fn is_inner(&self) -> bool {
        self.outer.is_some()
    }

    pub fn last_t(&self) -> Period {
        self.last_t
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Value already computed by this run, without evaluating anything
    pub fn cached(&self, cell: &str, t: Period) -> Option<f64> {
        self.cache.peek(&CellKey::new(cell, t, &[]))
    }

    /// Values of a cell computed so far by this run, by period
    pub fn cached_series(&self, cell: &str) -> Vec<(Period, f64)> {
        self.cache.series(cell).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::LapseShock;

    #[test]
    fn test_run_key_labels() {
        let key = RunKey::new(7, 3);
        assert_eq!(key.label(), "policy 7 / scen 3");

        let shocked = key.with_risk(Risk::Lapse(LapseShock::Mass), 5);
        assert_eq!(shocked.label(), "policy 7 / scen 3 / lapse_mass@5");
        assert_ne!(key, shocked);
    }

    #[test]
    fn test_new_run_is_empty() {
        let chain = OverrideChain::default();
        let run = ProjectionRun::new(RunId(4), RunKey::new(1, 1), chain, None, 10);

        assert_eq!(run.id().to_string(), "#4");
        assert!(!run.is_inner());
        assert_eq!(run.reprojection_time(), None);
        assert_eq!(run.cache_stats().entries, 0);
        assert_eq!(run.cached("PolsIF_End", 0), None);
    }
}
