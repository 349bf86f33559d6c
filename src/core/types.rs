use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeHorizon {
    Short,
    Medium,
    Long,
}

impl TimeHorizon {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "short" => Some(TimeHorizon::Short),
            "medium" => Some(TimeHorizon::Medium),
            "long" => Some(TimeHorizon::Long),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeHorizon::Short => "short",
            TimeHorizon::Medium => "medium",
            TimeHorizon::Long => "long",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskTolerance {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "conservative" => Some(RiskTolerance::Conservative),
            "moderate" => Some(RiskTolerance::Moderate),
            "aggressive" => Some(RiskTolerance::Aggressive),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskTolerance::Conservative => "conservative",
            RiskTolerance::Moderate => "moderate",
            RiskTolerance::Aggressive => "aggressive",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Experience {
    Beginner,
    Intermediate,
    Advanced,
}

impl Experience {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "beginner" => Some(Experience::Beginner),
            "intermediate" => Some(Experience::Intermediate),
            "advanced" => Some(Experience::Advanced),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Experience::Beginner => "beginner",
            Experience::Intermediate => "intermediate",
            Experience::Advanced => "advanced",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize)]
pub enum Goal {
    #[serde(rename = "Retirement planning")]
    RetirementPlanning,
    #[serde(rename = "Emergency fund")]
    EmergencyFund,
    #[serde(rename = "Buying a home")]
    BuyingAHome,
    #[serde(rename = "Education funding")]
    EducationFunding,
    #[serde(rename = "General wealth building")]
    GeneralWealthBuilding,
    #[serde(rename = "Short-term savings goals")]
    ShortTermSavings,
}

impl Goal {
    pub const ALL: [Goal; 6] = [
        Goal::RetirementPlanning,
        Goal::EmergencyFund,
        Goal::BuyingAHome,
        Goal::EducationFunding,
        Goal::GeneralWealthBuilding,
        Goal::ShortTermSavings,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Goal::RetirementPlanning => "Retirement planning",
            Goal::EmergencyFund => "Emergency fund",
            Goal::BuyingAHome => "Buying a home",
            Goal::EducationFunding => "Education funding",
            Goal::GeneralWealthBuilding => "General wealth building",
            Goal::ShortTermSavings => "Short-term savings goals",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Goal::ALL.iter().copied().find(|g| g.label() == raw.trim())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileDraft {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub annual_income: Option<f64>,
    pub investment_amount: Option<f64>,
    pub time_horizon: Option<TimeHorizon>,
    pub risk_tolerance: Option<RiskTolerance>,
    pub goals: Vec<Goal>,
    pub experience: Option<Experience>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub age: u32,
    pub annual_income: f64,
    pub income_range: &'static str,
    pub investment_amount: f64,
    pub time_horizon: TimeHorizon,
    pub risk_tolerance: RiskTolerance,
    pub goals: Vec<Goal>,
    pub experience: Experience,
}

pub const INCOME_RANGES: [&str; 4] = [
    "Less than $50,000",
    "$50,000 - $99,999",
    "$100,000 - $199,999",
    "$200,000 or more",
];

pub fn income_range(annual_income: f64) -> &'static str {
    if annual_income < 50_000.0 {
        INCOME_RANGES[0]
    } else if annual_income < 100_000.0 {
        INCOME_RANGES[1]
    } else if annual_income < 200_000.0 {
        INCOME_RANGES[2]
    } else {
        INCOME_RANGES[3]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationEntry {
    pub symbol: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub weight_percent: f64,
    pub dollar_amount: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ProjectionPoint {
    pub year: u32,
    pub conservative: u64,
    pub expected: u64,
    pub optimistic: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub risk_score: f64,
    pub risk_tolerance: RiskTolerance,
    pub allocation: Vec<AllocationEntry>,
    pub projections: Vec<ProjectionPoint>,
}
