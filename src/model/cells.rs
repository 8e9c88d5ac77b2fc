//! Cell names of the term-life model

pub const ATT_AGE: &str = "AttAge";
pub const DURATION: &str = "Duration";

pub const POLS_IF_END: &str = "PolsIF_End";
pub const POLS_IF_BEG: &str = "PolsIF_Beg";
pub const POLS_IF_BEG1: &str = "PolsIF_Beg1";
pub const POLS_MATURITY: &str = "PolsMaturity";
pub const POLS_DEATH: &str = "PolsDeath";
pub const POLS_SURR: &str = "PolsSurr";

pub const BASE_MORT_RATE: &str = "BaseMortRate";
pub const MORT_RATE: &str = "MortRate";
pub const MORT_RATE_FACTOR: &str = "MortRateFactor";
pub const SURR_RATE: &str = "SurrRate";
pub const SURR_RATE_MULT: &str = "SurrRateMult";
pub const SURR_RATE_SHOCK: &str = "SurrRateShock";
pub const SURR_RATE_LIMIT: &str = "SurrRateLimit";

pub const PREM_INCOME: &str = "PremIncome";
pub const BENEFIT_DEATH: &str = "BenefitDeath";
pub const BENEFIT_SURR: &str = "BenefitSurr";
pub const BENEFIT_MAT: &str = "BenefitMat";
pub const EXPS_MAINT: &str = "ExpsMaint";
pub const EXPS_MAINT_MULT: &str = "ExpsMaintMult";

pub const INFL_RATE: &str = "InflRate";
pub const INFL_FACTOR: &str = "InflFactor";
pub const DISC_RATE: &str = "DiscRate";
pub const DISC_FACTOR: &str = "DiscFactor";

pub const NET_INSUR_CF: &str = "NetInsurCF";
pub const PV_NET_CF: &str = "PV_NetCF";
pub const PV_PREM_INCOME: &str = "PV_PremIncome";
pub const BEL: &str = "BEL";

/// `SurvivalProb(t, n)`: probability of staying in force from t to t + n
pub const SURVIVAL_PROB: &str = "SurvivalProb";

/// State variables copied from the outer run at a re-projection time
pub const BOUNDARY: [&str; 3] = [POLS_IF_END, DISC_FACTOR, INFL_FACTOR];
