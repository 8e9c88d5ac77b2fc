//! Base (best estimate) formulas of the annual term-life model
//!
//! Policies in force roll forward year by year:
//!
//! ```text
//! PolsIF_Beg(t)  = PolsIF_End(t)
//! PolsIF_Beg1(t) = PolsIF_Beg(t) - PolsMaturity(t)
//! PolsIF_End(t)  = PolsIF_Beg1(t-1) - PolsDeath(t-1) - PolsSurr(t-1)
//! ```
//!
//! Deaths are applied before surrenders. Cashflows are per year and
//! discounted from the start of the year they fall in.

use crate::error::{ModelError, ModelResult};
use crate::model::cells::*;
use crate::projection::{Ctx, FormulaSet, Period};

/// Name of the base formula set
pub const BASE_SET: &str = "base";

pub fn term_life() -> FormulaSet {
    FormulaSet::new(BASE_SET)
        .with(ATT_AGE, |ctx, t| Ok(f64::from(ctx.attained_age()?) + f64::from(t)))
        .with(DURATION, |ctx, t| Ok(f64::from(ctx.duration()?) + f64::from(t)))
        .with(POLS_IF_END, pols_if_end)
        .with(POLS_IF_BEG, |ctx, t| ctx.cell(POLS_IF_END, t))
        .with(POLS_MATURITY, pols_maturity)
        .with(POLS_IF_BEG1, |ctx, t| {
            Ok(ctx.cell(POLS_IF_BEG, t)? - ctx.cell(POLS_MATURITY, t)?)
        })
        .with(POLS_DEATH, |ctx, t| {
            Ok(ctx.cell(POLS_IF_BEG1, t)? * ctx.cell(MORT_RATE, t)?)
        })
        .with(POLS_SURR, |ctx, t| {
            let exposed = ctx.cell(POLS_IF_BEG1, t)? - ctx.cell(POLS_DEATH, t)?;
            Ok(exposed * ctx.cell(SURR_RATE, t)?)
        })
        .with(BASE_MORT_RATE, base_mort_rate)
        .with(MORT_RATE, |ctx, t| {
            let factor = ctx.number_or("MortFactor", 1.0)?;
            Ok(ctx.cell(BASE_MORT_RATE, t)? * factor * ctx.cell(MORT_RATE_FACTOR, t)?)
        })
        .constant(MORT_RATE_FACTOR, 1.0)
        .with(SURR_RATE, |ctx, t| {
            let duration = ctx.cell(DURATION, t)? as u32;
            let rate = ctx.lapse_table()?.rate(duration);
            Ok(rate * ctx.cell(SURR_RATE_MULT, t)?)
        })
        .with(SURR_RATE_MULT, |ctx, _| ctx.number_or("SurrRateMult", 1.0))
        .with(PREM_INCOME, |ctx, t| {
            let premium = ctx.policy()?.annual_premium;
            Ok(ctx.cell(POLS_IF_BEG1, t)? * premium)
        })
        .with(BENEFIT_DEATH, |ctx, t| {
            let sum_assured = ctx.policy()?.sum_assured;
            Ok(ctx.cell(POLS_DEATH, t)? * sum_assured)
        })
        .with(BENEFIT_SURR, |ctx, t| {
            let payout = ctx.policy()?.sum_assured * ctx.number_or("CashValueRate", 0.0)?;
            Ok(ctx.cell(POLS_SURR, t)? * payout)
        })
        .with(BENEFIT_MAT, |ctx, t| {
            let payout = ctx.policy()?.sum_assured * ctx.number_or("MaturityBenefitRate", 0.0)?;
            Ok(ctx.cell(POLS_MATURITY, t)? * payout)
        })
        .with(EXPS_MAINT, exps_maint)
        .constant(EXPS_MAINT_MULT, 1.0)
        .with(INFL_RATE, |ctx, t| Ok(ctx.scenario()?.inflation_rate(t)))
        .with(INFL_FACTOR, |ctx, t| {
            if t == 0 {
                return Ok(1.0);
            }
            Ok(ctx.cell(INFL_FACTOR, t - 1)? * (1.0 + ctx.cell(INFL_RATE, t - 1)?))
        })
        .with(DISC_RATE, |ctx, t| Ok(ctx.scenario()?.interest_rate(t)))
        .with(DISC_FACTOR, |ctx, t| {
            if t == 0 {
                return Ok(1.0);
            }
            Ok(ctx.cell(DISC_FACTOR, t - 1)? / (1.0 + ctx.cell(DISC_RATE, t - 1)?))
        })
        .with(NET_INSUR_CF, |ctx, t| {
            Ok(ctx.cell(PREM_INCOME, t)?
                - ctx.cell(BENEFIT_DEATH, t)?
                - ctx.cell(BENEFIT_SURR, t)?
                - ctx.cell(BENEFIT_MAT, t)?
                - ctx.cell(EXPS_MAINT, t)?)
        })
        .with(PV_NET_CF, |ctx, t| present_value(ctx, NET_INSUR_CF, t))
        .with(PV_PREM_INCOME, |ctx, t| present_value(ctx, PREM_INCOME, t))
        .with(BEL, |ctx, t| Ok(-ctx.cell(PV_NET_CF, t)?))
        .with_args(SURVIVAL_PROB, survival_prob)
}

fn pols_if_end(ctx: &mut Ctx<'_>, t: Period) -> ModelResult<f64> {
    if t == 0 {
        return Ok(ctx.policy()?.count);
    }
    let prev = t - 1;
    Ok(ctx.cell(POLS_IF_BEG1, prev)? - ctx.cell(POLS_DEATH, prev)? - ctx.cell(POLS_SURR, prev)?)
}

fn pols_maturity(ctx: &mut Ctx<'_>, t: Period) -> ModelResult<f64> {
    if t == ctx.remaining_term()? {
        ctx.cell(POLS_IF_BEG, t)
    } else {
        Ok(0.0)
    }
}

fn base_mort_rate(ctx: &mut Ctx<'_>, t: Period) -> ModelResult<f64> {
    let age = ctx.cell(ATT_AGE, t)? as u32;
    let gender = ctx.policy()?.gender;
    let year = ctx.calendar_year(t);
    Ok(ctx.mortality_table()?.annual_rate(age, gender, year))
}

fn exps_maint(ctx: &mut Ctx<'_>, t: Period) -> ModelResult<f64> {
    let per_policy = ctx.number_or("ExpsMaintPol", 0.0)?;
    let per_sum_assured = ctx.number_or("ExpsMaintSA", 0.0)? * ctx.policy()?.sum_assured;
    let in_force = ctx.cell(POLS_IF_BEG1, t)?;
    let inflation = ctx.cell(INFL_FACTOR, t)?;
    Ok(in_force * (per_policy + per_sum_assured) * inflation * ctx.cell(EXPS_MAINT_MULT, t)?)
}

/// Value at t of a cashflow cell over t..=last_t
fn present_value(ctx: &mut Ctx<'_>, cell: &str, t: Period) -> ModelResult<f64> {
    let last_t = ctx.last_t();
    if t > last_t {
        return Ok(0.0);
    }
    let mut total = 0.0;
    for s in t..=last_t {
        total += ctx.cell(cell, s)? * ctx.cell(DISC_FACTOR, s)?;
    }
    Ok(total / ctx.cell(DISC_FACTOR, t)?)
}

fn survival_prob(ctx: &mut Ctx<'_>, t: Period, args: &[i64]) -> ModelResult<f64> {
    let [n] = args else {
        return Err(ModelError::InvalidArguments {
            cell: SURVIVAL_PROB.to_string(),
            expected: 1,
            got: args.len(),
        });
    };
    let n = *n;
    if n <= 0 {
        return Ok(1.0);
    }
    let s = t + Period::try_from(n - 1).unwrap_or(Period::MAX);
    let prev = ctx.cell_with(SURVIVAL_PROB, t, &[n - 1])?;
    Ok(prev * (1.0 - ctx.cell(MORT_RATE, s)?) * (1.0 - ctx.cell(SURR_RATE, s)?))
}
