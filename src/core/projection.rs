use super::types::{ProjectionPoint, RiskTolerance};

pub const DEFAULT_HORIZON_YEARS: u32 = 20;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RateTriple {
    pub conservative: f64,
    pub expected: f64,
    pub optimistic: f64,
}

pub const CONSERVATIVE_RATES: RateTriple = RateTriple {
    conservative: 0.04,
    expected: 0.06,
    optimistic: 0.08,
};

pub const MODERATE_RATES: RateTriple = RateTriple {
    conservative: 0.05,
    expected: 0.07,
    optimistic: 0.10,
};

pub const AGGRESSIVE_RATES: RateTriple = RateTriple {
    conservative: 0.06,
    expected: 0.09,
    optimistic: 0.12,
};

pub fn rates_for_tier(tier: RiskTolerance) -> RateTriple {
    match tier {
        RiskTolerance::Conservative => CONSERVATIVE_RATES,
        RiskTolerance::Moderate => MODERATE_RATES,
        RiskTolerance::Aggressive => AGGRESSIVE_RATES,
    }
}

pub fn project(base_amount: f64, rates: RateTriple, horizon_years: u32) -> Vec<ProjectionPoint> {
    let mut series = Vec::with_capacity(horizon_years as usize);
    for year in 1..=horizon_years {
        series.push(ProjectionPoint {
            year,
            conservative: compound(base_amount, rates.conservative, year),
            expected: compound(base_amount, rates.expected, year),
            optimistic: compound(base_amount, rates.optimistic, year),
        });
    }
    series
}

fn compound(base_amount: f64, rate: f64, year: u32) -> u64 {
    let value = base_amount * (1.0 + rate).powi(year as i32);
    value.round().max(0.0) as u64
}
