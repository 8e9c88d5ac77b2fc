//! Immutable reference data shared by every projection run
//!
//! Built once by the host and shared through an `Arc`. Nothing in the
//! projection core mutates it; swapping it out goes through
//! `ProjectionSpace::replace_reference`, which discards every run.

use std::sync::Arc;

use crate::assumptions::AssumptionSet;
use crate::policy::PolicyTable;
use crate::scenario::ScenarioSet;

/// Policy, assumption and scenario tables
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub policies: PolicyTable,
    pub assumptions: AssumptionSet,
    pub scenarios: ScenarioSet,
}

impl ReferenceData {
    pub fn new(policies: PolicyTable, assumptions: AssumptionSet, scenarios: ScenarioSet) -> Self {
        Self {
            policies,
            assumptions,
            scenarios,
        }
    }

    /// Wrap for sharing across spaces and worker threads
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
