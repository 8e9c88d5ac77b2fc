//! Error types for projection evaluation

use std::fmt;

use thiserror::Error;

use crate::projection::{Period, RunId};

/// Which bound a recursive evaluation ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionLimit {
    /// Requested period is before the start of the projection (t < 0)
    BeforeStart,
    /// Requested period is past the configured horizon
    Horizon(Period),
    /// Nested cell evaluations exceeded the configured depth
    Depth(usize),
}

impl fmt::Display for RecursionLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecursionLimit::BeforeStart => write!(f, "period is before the projection start"),
            RecursionLimit::Horizon(horizon) => write!(f, "period is past the horizon {}", horizon),
            RecursionLimit::Depth(depth) => write!(f, "evaluation depth exceeds {}", depth),
        }
    }
}

/// Errors raised while building or evaluating projections
///
/// Errors are fatal to the run being evaluated only. Values already cached in
/// that run (or in any other run) stay valid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Cell '{cell}' referenced from {referenced_from} is not in the active override chain")]
    UndefinedCell { cell: String, referenced_from: String },

    #[error("Recursion limit exceeded evaluating '{cell}' at t={t}: {limit}")]
    RecursionLimitExceeded {
        cell: String,
        t: Period,
        limit: RecursionLimit,
    },

    #[error("Circular reference: '{cell}' at t={t} depends on itself")]
    CircularReference { cell: String, t: Period },

    #[error("No formula for '{quantity}' in override chain [{chain}]")]
    NoFormulaFound { quantity: String, chain: String },

    #[error("Cell '{cell}' expects {expected} extra argument(s), got {got}")]
    InvalidArguments {
        cell: String,
        expected: usize,
        got: usize,
    },

    #[error("Assumption '{name}' has no value for policy {policy_id}")]
    MissingAssumption { name: String, policy_id: u32 },

    #[error("Unknown policy id: {0}")]
    UnknownPolicy(u32),

    #[error("Unknown scenario id: {0}")]
    UnknownScenario(u32),

    #[error("Duplicate policy id: {0}")]
    DuplicatePolicy(u32),

    #[error("Projection run {0} has been discarded")]
    StaleRun(RunId),

    #[error("Re-projection time {t0} is outside the horizon [0, {horizon}]")]
    InvalidReprojection { t0: Period, horizon: Period },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used throughout the crate
pub type ModelResult<T> = Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recursion_limit_message() {
        let err = ModelError::RecursionLimitExceeded {
            cell: "PolsIF_End".to_string(),
            t: 121,
            limit: RecursionLimit::Horizon(120),
        };
        let msg = err.to_string();
        assert!(msg.contains("PolsIF_End"));
        assert!(msg.contains("t=121"));
        assert!(msg.contains("horizon 120"));
    }

    #[test]
    fn test_undefined_cell_message() {
        let err = ModelError::UndefinedCell {
            cell: "SurrRate".to_string(),
            referenced_from: "PolsSurr".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cell 'SurrRate' referenced from PolsSurr is not in the active override chain"
        );
    }
}
