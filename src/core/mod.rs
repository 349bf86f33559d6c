mod engine;
mod projection;
mod types;
mod wizard;

pub use engine::{
    AllocationPolicy, RiskFactors, UnknownRiskTierError, build_allocation, parse_risk_tier,
    recommend, risk_score,
};
pub use projection::{
    AGGRESSIVE_RATES, CONSERVATIVE_RATES, DEFAULT_HORIZON_YEARS, MODERATE_RATES, RateTriple,
    project, rates_for_tier,
};
pub use types::{
    AllocationEntry, Experience, Goal, INCOME_RANGES, Profile, ProfileDraft, ProjectionPoint,
    Recommendation, RiskTolerance, TimeHorizon, income_range,
};
pub use wizard::{
    AdvanceOutcome, FieldError, FinalizeError, IntakeWizard, ProfileSubmitter, RetreatOutcome,
    Step, SubmissionError, validate_step,
};
