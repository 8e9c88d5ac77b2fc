//! Parameterized projection space
//!
//! The space owns every run of one model over one set of reference data.
//! Runs are created on demand per `RunKey`, evaluated lazily cell by cell and
//! memoized per run. Evaluation is single threaded; parallelism happens across
//! spaces (see `PortfolioRunner`).

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, trace};

use crate::config::ProjectionConfig;
use crate::error::{ModelError, ModelResult, RecursionLimit};
use crate::model::ModelDef;
use crate::projection::cell::CellKey;
use crate::projection::run::OuterLink;
use crate::projection::{
    Ctx, InnerProjection, InnerSpec, Period, ProjectionRun, Risk, RunId, RunKey,
};
use crate::reference::ReferenceData;

/// Identity of an inner run relative to its outer run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct InnerKey {
    outer: RunId,
    t0: Period,
    risk: Option<Risk>,
    /// Address of the overlay set; the inner run's chain keeps it alive
    overlay: Option<usize>,
}

/// A cell currently being computed
#[derive(Debug)]
struct Frame {
    run: RunId,
    key: CellKey,
    level: usize,
}

pub struct ProjectionSpace {
    reference: Arc<ReferenceData>,
    model: Arc<ModelDef>,
    config: ProjectionConfig,
    runs: Vec<Option<ProjectionRun>>,
    index: HashMap<RunKey, RunId>,
    inner_index: HashMap<InnerKey, RunId>,
    active: Vec<Frame>,
}

impl ProjectionSpace {
    pub fn new(
        reference: Arc<ReferenceData>,
        model: Arc<ModelDef>,
        config: ProjectionConfig,
    ) -> ModelResult<Self> {
        config
            .validate()
            .map_err(|e| ModelError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            reference,
            model,
            config,
            runs: Vec::new(),
            index: HashMap::new(),
            inner_index: HashMap::new(),
            active: Vec::new(),
        })
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn model(&self) -> &ModelDef {
        &self.model
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Run for `key`, created on first use
    pub fn instance(&mut self, key: RunKey) -> ModelResult<RunId> {
        if let Some(&id) = self.index.get(&key) {
            return Ok(id);
        }

        let policy = self
            .reference
            .policies
            .get(key.policy_id)
            .ok_or(ModelError::UnknownPolicy(key.policy_id))?;
        if self.reference.scenarios.get(key.scen_id).is_none() {
            return Err(ModelError::UnknownScenario(key.scen_id));
        }

        let remaining = Period::try_from(policy.remaining_term(self.config.valuation_date))
            .unwrap_or(Period::MAX);
        let last_t = remaining.min(self.config.horizon);
        let chain = self.model.chain_for(key.risk);

        let id = RunId(self.runs.len());
        debug!(
            "Creating run {} for {} (last_t={}, chain=[{}])",
            id,
            key.label(),
            last_t,
            chain.set_names().join(", ")
        );
        self.runs.push(Some(ProjectionRun::new(id, key, chain, None, last_t)));
        self.index.insert(key, id);
        Ok(id)
    }

    pub fn run(&self, id: RunId) -> ModelResult<&ProjectionRun> {
        self.runs
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(ModelError::StaleRun(id))
    }

    fn run_mut(&mut self, id: RunId) -> ModelResult<&mut ProjectionRun> {
        self.runs
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(ModelError::StaleRun(id))
    }

    /// Handles of all live runs, inner runs included
    pub fn run_ids(&self) -> Vec<RunId> {
        self.runs.iter().flatten().map(|run| run.id).collect()
    }

    /// Number of live runs
    pub fn len(&self) -> usize {
        self.runs.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value of an argument-free cell at period t
    pub fn evaluate(&mut self, run: RunId, cell: &str, t: Period) -> ModelResult<f64> {
        self.evaluate_with(run, cell, t, &[])
    }

    /// Value of a cell with extra arguments at period t
    pub fn evaluate_with(
        &mut self,
        run: RunId,
        cell: &str,
        t: Period,
        args: &[i64],
    ) -> ModelResult<f64> {
        self.run(run)?;
        self.eval_cell(run, cell, t, args)
    }

    /// Cell values for every period from 0 to the run's last period
    ///
    /// Periods are evaluated in ascending order, so recursive cells only ever
    /// recurse one step into the cache.
    pub fn values(&mut self, run: RunId, cell: &str) -> ModelResult<Vec<f64>> {
        let last_t = self.run(run)?.last_t;
        (0..=last_t).map(|t| self.eval_cell(run, cell, t, &[])).collect()
    }

    /// Inner run branching off `outer` at `t0` under the outer run's own chain
    pub fn reproject(&mut self, outer: RunId, t0: Period) -> ModelResult<InnerProjection> {
        self.reproject_with(outer, InnerSpec::at(t0))
    }

    /// Inner run branching off `outer` as described by `spec`
    ///
    /// Inner runs are cached: the same outer run, time, risk and overlay set
    /// give back the same inner run. Overlays are compared by identity, so two
    /// different sets sharing a name get separate inner runs.
    pub fn reproject_with(
        &mut self,
        outer: RunId,
        spec: InnerSpec,
    ) -> ModelResult<InnerProjection> {
        if spec.t0 < 0 || spec.t0 > self.config.horizon {
            return Err(ModelError::InvalidReprojection {
                t0: spec.t0,
                horizon: self.config.horizon,
            });
        }

        let outer_run = self.run(outer)?;
        let inner_key = InnerKey {
            outer,
            t0: spec.t0,
            risk: spec.risk,
            overlay: spec.overlay.as_ref().map(|set| Arc::as_ptr(set) as usize),
        };
        if let Some(&id) = self.inner_index.get(&inner_key) {
            return Ok(InnerProjection::new(id, outer, spec.t0));
        }

        let (key, chain) = match spec.risk {
            None => (outer_run.key, outer_run.chain.clone()),
            Some(risk) => (
                outer_run.key.with_risk(risk, spec.t0),
                self.model.chain_for(risk),
            ),
        };
        let chain = match spec.overlay {
            Some(overlay) => chain.with_front(overlay),
            None => chain,
        };
        let last_t = outer_run.last_t;

        let id = RunId(self.runs.len());
        debug!(
            "Re-projecting run {} at t0={} as run {} ({}, chain=[{}])",
            outer,
            spec.t0,
            id,
            key.label(),
            chain.set_names().join(", ")
        );
        let link = OuterLink { run: outer, t0: spec.t0 };
        self.runs.push(Some(ProjectionRun::new(id, key, chain, Some(link), last_t)));
        self.inner_index.insert(inner_key, id);
        Ok(InnerProjection::new(id, outer, spec.t0))
    }

    /// Drop a run and every inner run launched from it, directly or not
    ///
    /// Returns the number of runs dropped.
    pub fn discard(&mut self, id: RunId) -> ModelResult<usize> {
        self.run(id)?;

        // Inner runs are always created after their outer run
        let mut dropped = vec![id];
        for slot in self.runs.iter().skip(id.0 + 1).flatten() {
            if let Some(link) = slot.outer {
                if dropped.contains(&link.run) {
                    dropped.push(slot.id);
                }
            }
        }

        for run in &dropped {
            self.runs[run.0] = None;
        }
        self.index.retain(|_, run| !dropped.contains(run));
        self.inner_index
            .retain(|key, run| !dropped.contains(run) && !dropped.contains(&key.outer));

        debug!("Discarded run {} and {} dependent run(s)", id, dropped.len() - 1);
        Ok(dropped.len())
    }

    /// Swap the reference data, dropping every run
    ///
    /// Existing handles become stale; new runs get fresh handles.
    pub fn replace_reference(&mut self, reference: Arc<ReferenceData>) {
        let dropped = self.len();
        for slot in self.runs.iter_mut() {
            *slot = None;
        }
        self.index.clear();
        self.inner_index.clear();
        self.reference = reference;
        debug!("Replaced reference data, discarded {} run(s)", dropped);
    }

    fn check_period(&self, cell: &str, t: Period) -> ModelResult<()> {
        let limit = if t < 0 {
            RecursionLimit::BeforeStart
        } else if t > self.config.horizon {
            RecursionLimit::Horizon(self.config.horizon)
        } else {
            return Ok(());
        };
        Err(ModelError::RecursionLimitExceeded {
            cell: cell.to_string(),
            t,
            limit,
        })
    }

    pub(crate) fn eval_cell(
        &mut self,
        id: RunId,
        cell: &str,
        t: Period,
        args: &[i64],
    ) -> ModelResult<f64> {
        self.check_period(cell, t)?;

        let outer = self.run(id)?.outer;
        if let Some(link) = outer {
            if t < link.t0 {
                return self.eval_cell(link.run, cell, t, args);
            }
        }

        let key = CellKey::new(cell, t, args);
        if let Some(value) = self.run_mut(id)?.cache.get(&key) {
            return Ok(value);
        }

        if let Some(link) = outer {
            if t == link.t0 && args.is_empty() && self.model.is_boundary(cell) {
                let value = self.eval_cell(link.run, cell, t, args)?;
                self.run_mut(id)?.cache.insert(key, value);
                return Ok(value);
            }
        }

        self.compute(id, key, 0, true)
    }

    pub(crate) fn eval_base(
        &mut self,
        id: RunId,
        level: usize,
        cell: &str,
        t: Period,
        args: &[i64],
    ) -> ModelResult<f64> {
        self.check_period(cell, t)?;
        self.compute(id, CellKey::new(cell, t, args), level + 1, false)
    }

    fn compute(
        &mut self,
        id: RunId,
        key: CellKey,
        start_level: usize,
        memoize: bool,
    ) -> ModelResult<f64> {
        if self.active.len() >= self.config.max_depth {
            return Err(ModelError::RecursionLimitExceeded {
                cell: key.name,
                t: key.t,
                limit: RecursionLimit::Depth(self.config.max_depth),
            });
        }

        let run = self.run(id)?;
        let (run_key, last_t, t0) = (run.key, run.last_t, run.reprojection_time());
        let (level, formula) = match run.chain.resolve_from(&key.name, start_level) {
            Some(resolved) => (resolved.level, resolved.formula.clone()),
            None => {
                let referenced_from = self
                    .active
                    .last()
                    .map(|frame| format!("'{}' at t={}", frame.key.name, frame.key.t))
                    .unwrap_or_else(|| "<caller>".to_string());
                return Err(ModelError::UndefinedCell {
                    cell: key.name,
                    referenced_from,
                });
            }
        };

        if self
            .active
            .iter()
            .any(|frame| frame.run == id && frame.level == level && frame.key == key)
        {
            return Err(ModelError::CircularReference {
                cell: key.name,
                t: key.t,
            });
        }

        self.active.push(Frame {
            run: id,
            key: key.clone(),
            level,
        });
        let result = {
            let mut ctx = Ctx::new(&mut *self, id, level, run_key, last_t, t0);
            formula.call(&mut ctx, key.t, &key.args)
        };
        self.active.pop();
        let value = result?;

        if memoize {
            trace!("Run {}: {}({}) = {}", id, key.name, key.t, value);
            self.run_mut(id)?.cache.insert(key, value);
        }
        Ok(value)
    }
}
