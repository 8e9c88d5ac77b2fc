//! Portfolio runs and aggregation of per-run results
//!
//! `PortfolioRunner` shares reference data and the model across worker
//! threads and gives every run its own `ProjectionSpace`, so runs never share
//! a cache and a failing run cannot affect its siblings.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::ProjectionConfig;
use crate::error::{ModelError, ModelResult};
use crate::model::ModelDef;
use crate::projection::{InnerSpec, Period, ProjectionSpace, Risk, RunKey};
use crate::reference::ReferenceData;

/// Cell values of one completed run, by cell name then period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub key: RunKey,
    pub cells: BTreeMap<String, Vec<f64>>,
}

impl RunResult {
    pub fn value(&self, cell: &str, t: Period) -> Option<f64> {
        let index = usize::try_from(t).ok()?;
        self.cells.get(cell)?.get(index).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(RunResult),
    Failed { key: RunKey, error: ModelError },
}

impl RunOutcome {
    pub fn key(&self) -> RunKey {
        match self {
            RunOutcome::Completed(result) => result.key,
            RunOutcome::Failed { key, .. } => *key,
        }
    }

    pub fn result(&self) -> Option<&RunResult> {
        match self {
            RunOutcome::Completed(result) => Some(result),
            RunOutcome::Failed { .. } => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }
}

/// Batch runner over shared reference data
#[derive(Debug, Clone)]
pub struct PortfolioRunner {
    reference: Arc<ReferenceData>,
    model: Arc<ModelDef>,
    config: ProjectionConfig,
}

impl PortfolioRunner {
    pub fn new(
        reference: Arc<ReferenceData>,
        model: Arc<ModelDef>,
        config: ProjectionConfig,
    ) -> Self {
        Self {
            reference,
            model,
            config,
        }
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    fn space(&self) -> ModelResult<ProjectionSpace> {
        ProjectionSpace::new(self.reference.clone(), self.model.clone(), self.config.clone())
    }

    fn project(&self, key: RunKey, cells: &[&str]) -> ModelResult<RunResult> {
        let mut space = self.space()?;
        let run = space.instance(key)?;

        let mut values = BTreeMap::new();
        for &cell in cells {
            values.insert(cell.to_string(), space.values(run, cell)?);
        }
        Ok(RunResult { key, cells: values })
    }

    /// Project one run, evaluating `cells` over the run's whole projection
    pub fn run(&self, key: RunKey, cells: &[&str]) -> RunOutcome {
        match self.project(key, cells) {
            Ok(result) => RunOutcome::Completed(result),
            Err(error) => {
                warn!("Run {} failed: {}", key.label(), error);
                RunOutcome::Failed { key, error }
            }
        }
    }

    /// Project many runs in parallel; outcomes keep the order of `keys`
    pub fn run_batch(&self, keys: &[RunKey], cells: &[&str]) -> Vec<RunOutcome> {
        debug!("Running batch of {} projection(s)", keys.len());
        keys.par_iter().map(|&key| self.run(key, cells)).collect()
    }

    /// Every policy under one scenario and risk, summed by period
    pub fn run_portfolio(
        &self,
        scen_id: u32,
        risk: Risk,
        shock_start: Period,
        cells: &[&str],
    ) -> PortfolioSummary {
        let keys: Vec<RunKey> = self
            .reference
            .policies
            .ids()
            .map(|policy_id| RunKey::new(policy_id, scen_id).with_risk(risk, shock_start))
            .collect();
        PortfolioSummary::aggregate(&self.run_batch(&keys, cells))
    }

    /// One policy under many scenarios
    pub fn run_scenarios(
        &self,
        policy_id: u32,
        scen_ids: &[u32],
        cells: &[&str],
    ) -> Vec<RunOutcome> {
        let keys: Vec<RunKey> = scen_ids
            .iter()
            .map(|&scen_id| RunKey::new(policy_id, scen_id))
            .collect();
        self.run_batch(&keys, cells)
    }

    /// Change in `cell` at `t0` when the run is re-projected under `risk`
    ///
    /// Both sides are inner projections from the same outer run, so they
    /// share everything before `t0`.
    pub fn stress_delta(
        &self,
        key: RunKey,
        t0: Period,
        risk: Risk,
        cell: &str,
    ) -> ModelResult<f64> {
        let mut space = self.space()?;
        let outer = space.instance(key)?;

        let base = space.reproject_with(outer, InnerSpec::at(t0).with_risk(Risk::Base))?;
        let shocked = space.reproject_with(outer, InnerSpec::at(t0).with_risk(risk))?;

        let shocked_value = shocked.value_at(&mut space, cell, 0)?;
        let base_value = base.value_at(&mut space, cell, 0)?;
        Ok(shocked_value - base_value)
    }
}

/// Cell totals across completed runs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioSummary {
    /// Sum over runs, by cell then period
    pub totals: BTreeMap<String, Vec<f64>>,
    pub completed: usize,
    pub failures: Vec<(RunKey, ModelError)>,
}

impl PortfolioSummary {
    /// Sum completed runs period by period; runs of different length are
    /// padded with zeros
    pub fn aggregate(outcomes: &[RunOutcome]) -> Self {
        let mut summary = Self::default();

        for outcome in outcomes {
            match outcome {
                RunOutcome::Completed(result) => {
                    summary.completed += 1;
                    for (cell, values) in &result.cells {
                        let total = summary.totals.entry(cell.clone()).or_default();
                        if total.len() < values.len() {
                            total.resize(values.len(), 0.0);
                        }
                        for (sum, value) in total.iter_mut().zip(values) {
                            *sum += value;
                        }
                    }
                }
                RunOutcome::Failed { key, error } => {
                    summary.failures.push((*key, error.clone()));
                }
            }
        }

        summary
    }

    pub fn total(&self, cell: &str, t: Period) -> Option<f64> {
        let index = usize::try_from(t).ok()?;
        self.totals.get(cell)?.get(index).copied()
    }
}

/// One value in the long output table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub policy_id: u32,
    pub scen_id: u32,
    pub risk: Risk,
    pub shock_start: Period,
    pub cell: String,
    pub t: Period,
    pub value: f64,
}

/// Flatten completed runs into `(run, cell, t, value)` rows
pub fn concatenate(outcomes: &[RunOutcome]) -> Vec<TableRow> {
    outcomes
        .iter()
        .filter_map(RunOutcome::result)
        .flat_map(|result| {
            result.cells.iter().flat_map(move |(cell, values)| {
                values.iter().enumerate().map(move |(t, &value)| TableRow {
                    policy_id: result.key.policy_id,
                    scen_id: result.key.scen_id,
                    risk: result.key.risk,
                    shock_start: result.key.shock_start,
                    cell: cell.clone(),
                    t: t as Period,
                    value,
                })
            })
        })
        .collect()
}

/// Distribution of one cell value across runs (typically scenarios)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioStatistics {
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl ScenarioStatistics {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            count,
        })
    }

    /// Statistics of `cell` at `t` over the completed runs that reach `t`
    pub fn across(outcomes: &[RunOutcome], cell: &str, t: Period) -> Option<Self> {
        let values: Vec<f64> = outcomes
            .iter()
            .filter_map(RunOutcome::result)
            .filter_map(|result| result.value(cell, t))
            .collect();
        Self::from_values(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cells::{BEL, POLS_IF_END, PREM_INCOME};
    use crate::testing::{init_logging, sample_config, sample_reference};
    use approx::assert_relative_eq;

    fn runner() -> PortfolioRunner {
        init_logging();
        PortfolioRunner::new(sample_reference(), ModelDef::term_life().shared(), sample_config())
    }

    #[test]
    fn test_failed_run_does_not_affect_siblings() {
        let runner = runner();
        let keys = [RunKey::new(1, 1), RunKey::new(99, 1), RunKey::new(2, 1)];

        let outcomes = runner.run_batch(&keys, &[POLS_IF_END]);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_completed());
        assert_eq!(
            outcomes[1],
            RunOutcome::Failed {
                key: RunKey::new(99, 1),
                error: ModelError::UnknownPolicy(99),
            }
        );
        assert!(outcomes[2].is_completed());

        let summary = PortfolioSummary::aggregate(&outcomes);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.total(POLS_IF_END, 0), Some(200.0));
    }

    #[test]
    fn test_run_portfolio_sums_policies() {
        let runner = runner();
        let summary = runner.run_portfolio(1, Risk::Base, 0, &[PREM_INCOME]);

        assert_eq!(summary.completed, 2);
        assert!(summary.failures.is_empty());
        assert_eq!(summary.total(PREM_INCOME, 0), Some(1_000.0));
        assert_eq!(summary.totals[PREM_INCOME].len(), 16);
    }

    #[test]
    fn test_aggregate_pads_shorter_runs() {
        let key = RunKey::new(1, 1);
        let outcomes = vec![
            RunOutcome::Completed(RunResult {
                key,
                cells: BTreeMap::from([("X".to_string(), vec![1.0, 2.0, 3.0])]),
            }),
            RunOutcome::Completed(RunResult {
                key,
                cells: BTreeMap::from([("X".to_string(), vec![10.0])]),
            }),
        ];

        let summary = PortfolioSummary::aggregate(&outcomes);
        assert_eq!(summary.totals["X"], vec![11.0, 2.0, 3.0]);
    }

    #[test]
    fn test_concatenate() {
        let runner = runner();
        let outcomes = runner.run_batch(&[RunKey::new(1, 1), RunKey::new(99, 1)], &[POLS_IF_END]);

        let rows = concatenate(&outcomes);
        assert_eq!(rows.len(), 16);
        assert_eq!(rows[0].cell, POLS_IF_END);
        assert_eq!(rows[0].t, 0);
        assert_eq!(rows[0].value, 100.0);
        assert_eq!(rows[15].t, 15);

        let json = serde_json::to_string(&rows[0]).unwrap();
        assert!(json.contains("\"risk\":\"Base\""));
    }

    #[test]
    fn test_scenario_statistics() {
        let runner = runner();
        let outcomes = runner.run_scenarios(1, &[1, 2, 3], &[BEL]);
        assert!(outcomes.iter().all(RunOutcome::is_completed));

        let stats = ScenarioStatistics::across(&outcomes, BEL, 0).unwrap();
        assert_eq!(stats.count, 3);
        assert!(stats.min <= stats.mean && stats.mean <= stats.max);
        assert!(stats.std_dev > 0.0);

        // Lower interest gives a larger liability
        let bel = |i: usize| outcomes[i].result().and_then(|r| r.value(BEL, 0)).unwrap();
        assert!(bel(1) < bel(0));
        assert_eq!(stats.max, bel(2));
    }

    #[test]
    fn test_statistics_of_known_values() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats = ScenarioStatistics::from_values(&values).unwrap();
        assert_relative_eq!(stats.mean, 5.0);
        assert_relative_eq!(stats.std_dev, 2.0);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        assert!(ScenarioStatistics::from_values(&[]).is_none());
    }

    #[test]
    fn test_stress_delta() {
        let runner = runner();
        let key = RunKey::new(1, 1);

        let mort = runner.stress_delta(key, 5, Risk::Mortality, BEL).unwrap();
        let base = runner.stress_delta(key, 5, Risk::Base, BEL).unwrap();

        assert!(mort > 0.0);
        assert_eq!(base, 0.0);
        assert!(runner.stress_delta(RunKey::new(99, 1), 5, Risk::Mortality, BEL).is_err());
    }
}
