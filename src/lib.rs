//! Cashflow Model - recursive actuarial cashflow projections
//!
//! This library provides:
//! - Time-recursive model cells, memoized per projection run
//! - Projection spaces keyed by policy, scenario and risk factor
//! - Inner projections re-launched from an outer run at any period
//! - Override sets for Solvency II style stress testing
//! - Parallel portfolio runs with aggregation of per-run results

pub mod assumptions;
pub mod config;
pub mod error;
pub mod model;
pub mod policy;
pub mod projection;
pub mod reference;
pub mod scenario;
pub mod summary;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use assumptions::{AssumptionSet, AssumptionValue, LapseTable, MortalityTable};
pub use config::{ConfigError, ProjectionConfig, ShockConfig};
pub use error::{ModelError, ModelResult, RecursionLimit};
pub use model::ModelDef;
pub use policy::{Gender, PolicyPoint, PolicyTable};
pub use projection::{
    Ctx, FormulaSet, InnerProjection, InnerSpec, LapseShock, Period, ProjectionSpace, Risk, RunId,
    RunKey,
};
pub use reference::ReferenceData;
pub use scenario::{ScenarioCurve, ScenarioSet};
pub use summary::{
    concatenate, PortfolioRunner, PortfolioSummary, RunOutcome, RunResult, ScenarioStatistics,
    TableRow,
};
