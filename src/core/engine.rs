use thiserror::Error;

use super::projection::{DEFAULT_HORIZON_YEARS, project, rates_for_tier};
use super::types::{
    AllocationEntry, Experience, Profile, Recommendation, RiskTolerance, TimeHorizon,
};

#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("unknown risk tier: {tier}")]
pub struct UnknownRiskTierError {
    pub tier: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AllocationPolicy {
    FixedTier,
    Nuanced,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum AssetCategory {
    Bonds,
    UsStocks,
    InternationalStocks,
    RealEstate,
    Technology,
}

impl AssetCategory {
    const ALL: [AssetCategory; 5] = [
        AssetCategory::Bonds,
        AssetCategory::UsStocks,
        AssetCategory::InternationalStocks,
        AssetCategory::RealEstate,
        AssetCategory::Technology,
    ];

    fn label(self) -> &'static str {
        match self {
            AssetCategory::Bonds => "Bonds",
            AssetCategory::UsStocks => "U.S. Stocks",
            AssetCategory::InternationalStocks => "International Stocks",
            AssetCategory::RealEstate => "Real Estate",
            AssetCategory::Technology => "Technology",
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            AssetCategory::Bonds => "BND",
            AssetCategory::UsStocks => "VTI",
            AssetCategory::InternationalStocks => "VXUS",
            AssetCategory::RealEstate => "VNQ",
            AssetCategory::Technology => "VGT",
        }
    }

    fn fund_name(self) -> &'static str {
        match self {
            AssetCategory::Bonds => "Vanguard Total Bond Market ETF",
            AssetCategory::UsStocks => "Vanguard Total Stock Market ETF",
            AssetCategory::InternationalStocks => "Vanguard Total International Stock ETF",
            AssetCategory::RealEstate => "Vanguard Real Estate ETF",
            AssetCategory::Technology => "Vanguard Information Technology ETF",
        }
    }
}

const CONSERVATIVE_SCORE: f64 = 3.0;
const MODERATE_SCORE: f64 = 6.0;
const AGGRESSIVE_SCORE: f64 = 9.0;

const CONSERVATIVE_WEIGHTS: &[(AssetCategory, f64)] = &[
    (AssetCategory::Bonds, 40.0),
    (AssetCategory::UsStocks, 35.0),
    (AssetCategory::InternationalStocks, 15.0),
    (AssetCategory::RealEstate, 10.0),
];

const MODERATE_WEIGHTS: &[(AssetCategory, f64)] = &[
    (AssetCategory::UsStocks, 50.0),
    (AssetCategory::InternationalStocks, 25.0),
    (AssetCategory::Bonds, 20.0),
    (AssetCategory::RealEstate, 5.0),
];

const AGGRESSIVE_WEIGHTS: &[(AssetCategory, f64)] = &[
    (AssetCategory::UsStocks, 60.0),
    (AssetCategory::InternationalStocks, 30.0),
    (AssetCategory::Technology, 10.0),
];

#[derive(Copy, Clone, Debug)]
pub struct RiskFactors<'a> {
    pub age: u32,
    pub annual_income: f64,
    pub investment_amount: f64,
    pub time_horizon: TimeHorizon,
    pub risk_tolerance: &'a str,
    pub experience: Experience,
}

impl<'a> From<&'a Profile> for RiskFactors<'a> {
    fn from(profile: &'a Profile) -> Self {
        RiskFactors {
            age: profile.age,
            annual_income: profile.annual_income,
            investment_amount: profile.investment_amount,
            time_horizon: profile.time_horizon,
            risk_tolerance: profile.risk_tolerance.as_str(),
            experience: profile.experience,
        }
    }
}

pub fn parse_risk_tier(raw: &str) -> Result<RiskTolerance, UnknownRiskTierError> {
    RiskTolerance::parse(raw).ok_or_else(|| UnknownRiskTierError {
        tier: raw.to_string(),
    })
}

pub fn risk_score(
    factors: &RiskFactors<'_>,
    policy: AllocationPolicy,
) -> Result<f64, UnknownRiskTierError> {
    let tier = parse_risk_tier(factors.risk_tolerance)?;
    Ok(score_for(tier, factors, policy))
}

pub fn build_allocation(
    factors: &RiskFactors<'_>,
    policy: AllocationPolicy,
) -> Result<(f64, Vec<AllocationEntry>), UnknownRiskTierError> {
    let tier = parse_risk_tier(factors.risk_tolerance)?;
    let score = score_for(tier, factors, policy);
    let weights = weights_for(tier, score, policy);
    Ok((score, entries_for(&weights, factors.investment_amount)))
}

pub fn recommend(
    factors: &RiskFactors<'_>,
    policy: AllocationPolicy,
) -> Result<Recommendation, UnknownRiskTierError> {
    let tier = parse_risk_tier(factors.risk_tolerance)?;
    let score = score_for(tier, factors, policy);
    let weights = weights_for(tier, score, policy);
    let allocation = entries_for(&weights, factors.investment_amount);
    let projections = project(
        factors.investment_amount,
        rates_for_tier(tier),
        DEFAULT_HORIZON_YEARS,
    );
    Ok(Recommendation {
        risk_score: score,
        risk_tolerance: tier,
        allocation,
        projections,
    })
}

fn tier_score(tier: RiskTolerance) -> f64 {
    match tier {
        RiskTolerance::Conservative => CONSERVATIVE_SCORE,
        RiskTolerance::Moderate => MODERATE_SCORE,
        RiskTolerance::Aggressive => AGGRESSIVE_SCORE,
    }
}

fn tier_weights(tier: RiskTolerance) -> &'static [(AssetCategory, f64)] {
    match tier {
        RiskTolerance::Conservative => CONSERVATIVE_WEIGHTS,
        RiskTolerance::Moderate => MODERATE_WEIGHTS,
        RiskTolerance::Aggressive => AGGRESSIVE_WEIGHTS,
    }
}

fn score_for(tier: RiskTolerance, factors: &RiskFactors<'_>, policy: AllocationPolicy) -> f64 {
    match policy {
        AllocationPolicy::FixedTier => tier_score(tier),
        AllocationPolicy::Nuanced => nuanced_score(tier, factors),
    }
}

fn nuanced_score(tier: RiskTolerance, factors: &RiskFactors<'_>) -> f64 {
    let mut score = tier_score(tier);

    if factors.age < 30 {
        score += 1.0;
    } else if factors.age > 50 {
        score -= 1.0;
    }

    match factors.time_horizon {
        TimeHorizon::Long => score += 1.0,
        TimeHorizon::Short => score -= 1.0,
        TimeHorizon::Medium => {}
    }

    if factors.annual_income > 0.0 && factors.investment_amount / factors.annual_income > 0.20 {
        score -= 1.0;
    }

    match factors.experience {
        Experience::Advanced => score += 0.5,
        Experience::Beginner => score -= 0.5,
        Experience::Intermediate => {}
    }

    score.clamp(0.0, 10.0)
}

fn weights_for(
    tier: RiskTolerance,
    score: f64,
    policy: AllocationPolicy,
) -> Vec<(AssetCategory, f64)> {
    match policy {
        AllocationPolicy::FixedTier => tier_weights(tier).to_vec(),
        AllocationPolicy::Nuanced => blended_weights(score),
    }
}

// Tier tables are anchored at scores 3/6/9; a score between two anchors
// blends each category's weight linearly, which preserves the 100 total.
fn blended_weights(score: f64) -> Vec<(AssetCategory, f64)> {
    let (lower, upper, t) = if score <= CONSERVATIVE_SCORE {
        (CONSERVATIVE_WEIGHTS, CONSERVATIVE_WEIGHTS, 0.0)
    } else if score < MODERATE_SCORE {
        (
            CONSERVATIVE_WEIGHTS,
            MODERATE_WEIGHTS,
            (score - CONSERVATIVE_SCORE) / (MODERATE_SCORE - CONSERVATIVE_SCORE),
        )
    } else if score < AGGRESSIVE_SCORE {
        (
            MODERATE_WEIGHTS,
            AGGRESSIVE_WEIGHTS,
            (score - MODERATE_SCORE) / (AGGRESSIVE_SCORE - MODERATE_SCORE),
        )
    } else {
        (AGGRESSIVE_WEIGHTS, AGGRESSIVE_WEIGHTS, 1.0)
    };

    AssetCategory::ALL
        .iter()
        .filter_map(|&category| {
            let low = weight_in(lower, category);
            let high = weight_in(upper, category);
            let weight = low + (high - low) * t;
            (weight > 1e-9).then_some((category, weight))
        })
        .collect()
}

fn weight_in(table: &[(AssetCategory, f64)], category: AssetCategory) -> f64 {
    table
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, w)| *w)
        .unwrap_or(0.0)
}

fn entries_for(weights: &[(AssetCategory, f64)], investment_amount: f64) -> Vec<AllocationEntry> {
    weights
        .iter()
        .map(|&(category, weight_percent)| AllocationEntry {
            symbol: category.symbol(),
            name: category.fund_name(),
            category: category.label(),
            weight_percent,
            dollar_amount: round_cents(investment_amount * weight_percent / 100.0),
        })
        .collect()
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
