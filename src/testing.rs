//! Shared fixtures for unit tests
//!
//! Two identical term policies (age 40 at entry on 2020-01-01, 20-year term,
//! 100 policies of 1,000 sum assured) valued at 2025-01-01, so duration is 5,
//! attained age 45 and 15 years remain. Mortality is a flat 1% and lapses a
//! flat 5%, so the in-force shrinks by 0.9405 a year.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::assumptions::{AssumptionSet, AssumptionValue, LapseTable, MortalityTable};
use crate::config::ProjectionConfig;
use crate::model::ModelDef;
use crate::policy::{Gender, PolicyPoint, PolicyTable};
use crate::projection::ProjectionSpace;
use crate::reference::ReferenceData;
use crate::scenario::{ScenarioCurve, ScenarioSet};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn valuation_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

pub fn sample_policy(policy_id: u32) -> PolicyPoint {
    PolicyPoint::new(
        policy_id,
        "TERM",
        "A",
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        40,
        Gender::Male,
        20,
        100.0,
        1_000.0,
        5.0,
    )
}

pub fn sample_assumptions() -> AssumptionSet {
    let mut assumptions = AssumptionSet::new();
    assumptions.add_mortality_table("M1", MortalityTable::flat(0.01, 120));
    assumptions.add_lapse_table("L1", LapseTable::flat(0.05));
    let mort_table = AssumptionValue::Table("M1".to_string());
    let lapse_table = AssumptionValue::Table("L1".to_string());
    assumptions.insert("MortTable", Some("TERM"), None, None, mort_table);
    assumptions.insert("LapseTable", Some("TERM"), None, None, lapse_table);
    assumptions.set_number("ExpsMaintPol", 2.0);
    assumptions
}

/// Scenario 1: 3% / 2%, scenario 2: 5% / 2%, scenario 3: no interest or inflation
pub fn sample_scenarios() -> ScenarioSet {
    ScenarioSet::from_curves(vec![
        ScenarioCurve::flat(1, 0.03, 0.02),
        ScenarioCurve::flat(2, 0.05, 0.02),
        ScenarioCurve::flat(3, 0.0, 0.0),
    ])
}

pub fn sample_reference_data() -> ReferenceData {
    let policies = PolicyTable::from_points(vec![sample_policy(1), sample_policy(2)]).unwrap();
    ReferenceData::new(policies, sample_assumptions(), sample_scenarios())
}

pub fn sample_reference() -> Arc<ReferenceData> {
    sample_reference_data().shared()
}

pub fn sample_config() -> ProjectionConfig {
    ProjectionConfig {
        horizon: 30,
        valuation_date: valuation_date(),
        ..ProjectionConfig::default()
    }
}

pub fn term_life_space() -> ProjectionSpace {
    init_logging();
    let model = ModelDef::term_life().shared();
    ProjectionSpace::new(sample_reference(), model, sample_config()).unwrap()
}
