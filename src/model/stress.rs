//! Stress override sets
//!
//! Each set redefines only the cells its risk moves and defers to the formula
//! it replaces (`base_cell`) before the shock start.

use crate::error::ModelResult;
use crate::model::cells::*;
use crate::projection::{
    lapse_down_rate, lapse_up_rate, mass_lapse_rate, mortality_factor, Ctx, FormulaSet, Period,
};

/// Shocked mortality multiplier, shared by the mortality and longevity sets
fn shocked_mort_factor(ctx: &mut Ctx<'_>, t: Period) -> ModelResult<f64> {
    let age = ctx.cell(ATT_AGE, t)? as u32;
    Ok(mortality_factor(ctx.risk(), t, ctx.shock_start(), age, ctx.shock_config()))
}

pub fn mortality() -> FormulaSet {
    FormulaSet::new("mort").with(MORT_RATE_FACTOR, shocked_mort_factor)
}

pub fn longevity() -> FormulaSet {
    FormulaSet::new("longev").with(MORT_RATE_FACTOR, shocked_mort_factor)
}

pub fn lapse_up() -> FormulaSet {
    FormulaSet::new("lapse_up")
        .with(SURR_RATE_SHOCK, |ctx, _| Ok(ctx.shock_config().lapse_up_factor))
        .with(SURR_RATE_LIMIT, |ctx, _| Ok(ctx.shock_config().lapse_up_limit))
        .with(SURR_RATE, |ctx, t| {
            let base = ctx.base_cell(SURR_RATE, t)?;
            if t < ctx.shock_start() {
                return Ok(base);
            }
            let factor = ctx.cell(SURR_RATE_SHOCK, t)?;
            let limit = ctx.cell(SURR_RATE_LIMIT, t)?;
            Ok(lapse_up_rate(base, factor, limit))
        })
}

pub fn lapse_down() -> FormulaSet {
    FormulaSet::new("lapse_down").with(SURR_RATE, |ctx, t| {
        let base = ctx.base_cell(SURR_RATE, t)?;
        if t < ctx.shock_start() {
            return Ok(base);
        }
        let shock = ctx.shock_config();
        Ok(lapse_down_rate(base, shock.lapse_down_factor, shock.lapse_down_max_decrease))
    })
}

pub fn lapse_mass() -> FormulaSet {
    FormulaSet::new("lapse_mass").with(SURR_RATE, |ctx, t| {
        let base = ctx.base_cell(SURR_RATE, t)?;
        if t != ctx.shock_start() {
            return Ok(base);
        }
        Ok(mass_lapse_rate(base, ctx.shock_config().lapse_mass_rate))
    })
}

pub fn expense() -> FormulaSet {
    FormulaSet::new("exps")
        .with(EXPS_MAINT_MULT, |ctx, t| {
            if t < ctx.shock_start() {
                return ctx.base_cell(EXPS_MAINT_MULT, t);
            }
            Ok(1.0 + ctx.shock_config().expense_factor)
        })
        .with(INFL_RATE, |ctx, t| {
            let base = ctx.base_cell(INFL_RATE, t)?;
            if t < ctx.shock_start() {
                return Ok(base);
            }
            Ok(base + ctx.shock_config().expense_infl_add)
        })
}
