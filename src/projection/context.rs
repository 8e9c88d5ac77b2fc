//! Evaluation context handed to every formula
//!
//! A formula sees the run it is evaluated in: other cells of that run, the
//! policy, scenario and assumptions bound to the run key, and the shock
//! parameters. It never sees other runs except through inner projections it
//! launches itself.

use chrono::{Datelike, NaiveDate};

use crate::assumptions::{AssumptionSet, AssumptionValue, LapseTable, MortalityTable};
use crate::config::{ProjectionConfig, ShockConfig};
use crate::error::{ModelError, ModelResult};
use crate::policy::PolicyPoint;
use crate::projection::{
    InnerProjection, InnerSpec, Period, ProjectionSpace, Risk, RunId, RunKey,
};
use crate::scenario::ScenarioCurve;

/// Assumption naming the mortality table id
pub const MORT_TABLE: &str = "MortTable";

/// Assumption naming the lapse table id
pub const LAPSE_TABLE: &str = "LapseTable";

/// Handle a formula evaluates through, bound to one run and chain level
pub struct Ctx<'s> {
    space: &'s mut ProjectionSpace,
    run: RunId,
    /// Chain level of the formula being evaluated
    level: usize,
    key: RunKey,
    last_t: Period,
    reprojection_time: Option<Period>,
}

impl<'s> Ctx<'s> {
    pub(crate) fn new(
        space: &'s mut ProjectionSpace,
        run: RunId,
        level: usize,
        key: RunKey,
        last_t: Period,
        reprojection_time: Option<Period>,
    ) -> Self {
        Self {
            space,
            run,
            level,
            key,
            last_t,
            reprojection_time,
        }
    }

    /// Value of another cell of this run
    pub fn cell(&mut self, name: &str, t: Period) -> ModelResult<f64> {
        self.space.eval_cell(self.run, name, t, &[])
    }

    /// Value of a cell that takes extra arguments
    pub fn cell_with(&mut self, name: &str, t: Period, args: &[i64]) -> ModelResult<f64> {
        self.space.eval_cell(self.run, name, t, args)
    }

    /// Value of `name` under the next definition below the current formula's set
    ///
    /// Lets an override wrap the formula it replaces. The result is not cached.
    pub fn base_cell(&mut self, name: &str, t: Period) -> ModelResult<f64> {
        self.space.eval_base(self.run, self.level, name, t, &[])
    }

    pub fn base_cell_with(&mut self, name: &str, t: Period, args: &[i64]) -> ModelResult<f64> {
        self.space.eval_base(self.run, self.level, name, t, args)
    }

    /// Launch (or reuse) an inner projection from this run
    pub fn reproject(&mut self, spec: InnerSpec) -> ModelResult<InnerProjection> {
        self.space.reproject_with(self.run, spec)
    }

    /// Value of an inner projection `k` periods after its re-projection time
    pub fn inner_value(
        &mut self,
        inner: &InnerProjection,
        cell: &str,
        k: Period,
    ) -> ModelResult<f64> {
        inner.value_at(self.space, cell, k)
    }

    pub fn policy(&self) -> ModelResult<&PolicyPoint> {
        self.space
            .reference()
            .policies
            .get(self.key.policy_id)
            .ok_or(ModelError::UnknownPolicy(self.key.policy_id))
    }

    pub fn scenario(&self) -> ModelResult<&ScenarioCurve> {
        self.space
            .reference()
            .scenarios
            .get(self.key.scen_id)
            .ok_or(ModelError::UnknownScenario(self.key.scen_id))
    }

    pub fn assumptions(&self) -> &AssumptionSet {
        &self.space.reference().assumptions
    }

    /// Assumption lookup scoped to the run's policy
    pub fn lookup(&self, name: &str) -> ModelResult<Option<&AssumptionValue>> {
        let policy = self.policy()?;
        Ok(self.assumptions().lookup(
            name,
            Some(policy.product.as_str()),
            Some(policy.plan.as_str()),
            policy.generation,
        ))
    }

    /// Numeric assumption, or `default` when the lookup misses
    pub fn number_or(&self, name: &str, default: f64) -> ModelResult<f64> {
        Ok(self
            .lookup(name)?
            .and_then(AssumptionValue::as_number)
            .unwrap_or(default))
    }

    pub fn require_number(&self, name: &str) -> ModelResult<f64> {
        self.lookup(name)?
            .and_then(AssumptionValue::as_number)
            .ok_or_else(|| self.missing(name))
    }

    pub fn mortality_table(&self) -> ModelResult<&MortalityTable> {
        let id = self.table_id(MORT_TABLE)?;
        self.assumptions()
            .mortality_table(id)
            .ok_or_else(|| self.missing(MORT_TABLE))
    }

    pub fn lapse_table(&self) -> ModelResult<&LapseTable> {
        let id = self.table_id(LAPSE_TABLE)?;
        self.assumptions()
            .lapse_table(id)
            .ok_or_else(|| self.missing(LAPSE_TABLE))
    }

    fn table_id(&self, name: &str) -> ModelResult<&str> {
        self.lookup(name)?
            .and_then(AssumptionValue::as_table)
            .ok_or_else(|| self.missing(name))
    }

    fn missing(&self, name: &str) -> ModelError {
        ModelError::MissingAssumption {
            name: name.to_string(),
            policy_id: self.key.policy_id,
        }
    }

    pub fn config(&self) -> &ProjectionConfig {
        self.space.config()
    }

    pub fn shock_config(&self) -> &ShockConfig {
        &self.space.config().shock
    }

    pub fn valuation_date(&self) -> NaiveDate {
        self.space.config().valuation_date
    }

    /// Calendar year of projection period t
    pub fn calendar_year(&self, t: Period) -> i32 {
        self.valuation_date().year() + t
    }

    /// Completed policy years at the valuation date
    pub fn duration(&self) -> ModelResult<u32> {
        Ok(self.policy()?.duration_at(self.valuation_date()))
    }

    /// Attained age at the valuation date
    pub fn attained_age(&self) -> ModelResult<u32> {
        Ok(self.policy()?.attained_age_at(self.valuation_date()))
    }

    /// Years to maturity at the valuation date
    pub fn remaining_term(&self) -> ModelResult<Period> {
        let years = self.policy()?.remaining_term(self.valuation_date());
        Ok(Period::try_from(years).unwrap_or(Period::MAX))
    }

    pub fn risk(&self) -> Risk {
        self.key.risk
    }

    pub fn shock_start(&self) -> Period {
        self.key.shock_start
    }

    pub fn run_key(&self) -> RunKey {
        self.key
    }

    pub fn run_id(&self) -> RunId {
        self.run
    }

    /// Last period with business in force for this run
    pub fn last_t(&self) -> Period {
        self.last_t
    }

    /// Re-projection time when evaluating inside an inner run
    pub fn reprojection_time(&self) -> Option<Period> {
        self.reprojection_time
    }
}
