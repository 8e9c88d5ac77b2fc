//! Projection core: memoized recursive cells, runs, inner projections and overrides

mod cell;
mod context;
mod formula;
mod inner;
mod run;
mod shock;
mod space;

pub use cell::{CacheStats, CellCache, CellKey, Period};
pub use context::{Ctx, LAPSE_TABLE, MORT_TABLE};
pub use formula::{resolve, Formula, FormulaSet, OverrideChain, Resolved};
pub use inner::{InnerProjection, InnerSpec};
pub use run::{ProjectionRun, RunId, RunKey};
pub use shock::{
    lapse_down_rate, lapse_up_rate, mass_lapse_rate, mortality_factor, LapseShock, Risk,
};
pub use space::ProjectionSpace;
