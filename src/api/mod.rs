use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Router,
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{
    AllocationPolicy, Experience, Goal, INCOME_RANGES, ProjectionPoint, Recommendation,
    RiskFactors, RiskTolerance, TimeHorizon, recommend,
};

#[derive(Clone, Default)]
struct AppState {
    profiles: Arc<Mutex<ProfileTable>>,
}

#[derive(Default)]
struct ProfileTable {
    next_id: u64,
    rows: HashMap<u64, StoredProfile>,
}

impl ProfileTable {
    fn insert(&mut self, mut profile: StoredProfile) -> u64 {
        self.next_id += 1;
        profile.id = self.next_id;
        self.rows.insert(self.next_id, profile);
        self.next_id
    }

    fn get(&self, id: u64) -> Option<StoredProfile> {
        self.rows.get(&id).cloned()
    }

    fn remove(&mut self, id: u64) -> bool {
        self.rows.remove(&id).is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
struct StoredProfile {
    id: u64,
    name: String,
    age: u32,
    income_range: String,
    investment_amount: f64,
    time_horizon: String,
    risk_tolerance: String,
    investment_goals: String,
    experience: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RecommendPayload {
    age: Option<u32>,
    income: Option<f64>,
    #[serde(alias = "investmentAmount")]
    investment_amount: Option<f64>,
    #[serde(alias = "timeHorizon")]
    time_horizon: Option<String>,
    #[serde(alias = "riskTolerance")]
    risk_tolerance: Option<String>,
    experience: Option<String>,
    policy: Option<String>,
}

#[derive(Debug)]
struct RecommendRequest {
    age: u32,
    income: f64,
    investment_amount: f64,
    time_horizon: TimeHorizon,
    risk_tolerance: String,
    experience: Experience,
    policy: AllocationPolicy,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OnboardPayload {
    name: Option<String>,
    age: Option<u32>,
    income_range: Option<String>,
    investment_amount: Option<f64>,
    time_horizon: Option<String>,
    risk_tolerance: Option<String>,
    investment_goals: Option<String>,
    experience: Option<String>,
}

#[derive(Debug, Serialize)]
struct RecommendResponse {
    risk_score: f64,
    risk_tolerance_original: &'static str,
    recommended_portfolio: Vec<PortfolioHolding>,
    projections: Vec<ProjectionPoint>,
}

#[derive(Debug, Serialize)]
struct PortfolioHolding {
    symbol: &'static str,
    name: &'static str,
    category: &'static str,
    allocation: f64,
    investment_amount: f64,
}

#[derive(Debug, Serialize)]
struct OnboardCreated {
    status: &'static str,
    profile_id: u64,
}

#[derive(Debug, Serialize)]
struct OnboardDeleted {
    status: &'static str,
    profile_id: u64,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn recommend_request_from_payload(payload: RecommendPayload) -> Result<RecommendRequest, String> {
    let Some(age) = payload.age else {
        return Err("age is required".to_string());
    };
    if !(18..=100).contains(&age) {
        return Err("age must be between 18 and 100".to_string());
    }

    let Some(income) = payload.income else {
        return Err("income is required".to_string());
    };
    if !income.is_finite() || income < 0.0 {
        return Err("income must be zero or more".to_string());
    }

    let Some(investment_amount) = payload.investment_amount else {
        return Err("investment_amount is required".to_string());
    };
    if !investment_amount.is_finite() || investment_amount <= 0.0 {
        return Err("investment_amount must be a positive number".to_string());
    }

    let Some(raw_horizon) = payload.time_horizon else {
        return Err("time_horizon is required".to_string());
    };
    let Some(time_horizon) = TimeHorizon::parse(&raw_horizon) else {
        return Err("time_horizon must be one of short, medium, long".to_string());
    };

    let Some(risk_tolerance) = payload.risk_tolerance else {
        return Err("risk_tolerance is required".to_string());
    };

    let Some(raw_experience) = payload.experience else {
        return Err("experience is required".to_string());
    };
    let Some(experience) = Experience::parse(&raw_experience) else {
        return Err("experience must be one of beginner, intermediate, advanced".to_string());
    };

    let policy = match payload.policy.as_deref() {
        None | Some("nuanced") => AllocationPolicy::Nuanced,
        Some("fixed-tier") | Some("fixed_tier") | Some("fixedTier") => AllocationPolicy::FixedTier,
        Some(other) => {
            return Err(format!(
                "policy must be nuanced or fixed-tier, got {other:?}"
            ));
        }
    };

    Ok(RecommendRequest {
        age,
        income,
        investment_amount,
        time_horizon,
        risk_tolerance,
        experience,
        policy,
    })
}

fn onboard_record_from_payload(payload: OnboardPayload) -> Result<StoredProfile, String> {
    let Some(name) = payload.name else {
        return Err("name is required".to_string());
    };
    let name = name.trim().to_string();
    if name.chars().count() < 2 {
        return Err("Name must be at least 2 characters.".to_string());
    }

    let Some(age) = payload.age else {
        return Err("age is required".to_string());
    };
    if !(18..=100).contains(&age) {
        return Err("Age must be between 18 and 100.".to_string());
    }

    let Some(income_range) = payload.income_range else {
        return Err("income_range is required".to_string());
    };
    if !INCOME_RANGES.contains(&income_range.as_str()) {
        return Err("income_range must be one of the declared buckets".to_string());
    }

    let Some(investment_amount) = payload.investment_amount else {
        return Err("investment_amount is required".to_string());
    };
    if !investment_amount.is_finite() || investment_amount <= 0.0 {
        return Err("Investment amount must be a positive number.".to_string());
    }

    let Some(raw_horizon) = payload.time_horizon else {
        return Err("time_horizon is required".to_string());
    };
    let Some(time_horizon) = TimeHorizon::parse(&raw_horizon) else {
        return Err("time_horizon must be one of short, medium, long".to_string());
    };

    let Some(raw_tolerance) = payload.risk_tolerance else {
        return Err("risk_tolerance is required".to_string());
    };
    let Some(risk_tolerance) = RiskTolerance::parse(&raw_tolerance) else {
        return Err("risk_tolerance must be one of conservative, moderate, aggressive".to_string());
    };

    let Some(raw_goals) = payload.investment_goals else {
        return Err("investment_goals is required".to_string());
    };
    let mut goals = Vec::new();
    for part in raw_goals.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let Some(goal) = Goal::parse(part) else {
            return Err(format!("unknown investment goal: {part:?}"));
        };
        if !goals.contains(&goal) {
            goals.push(goal);
        }
    }
    if goals.is_empty() {
        return Err("investment_goals must list at least one goal".to_string());
    }

    let Some(raw_experience) = payload.experience else {
        return Err("experience is required".to_string());
    };
    let Some(experience) = Experience::parse(&raw_experience) else {
        return Err("experience must be one of beginner, intermediate, advanced".to_string());
    };

    Ok(StoredProfile {
        id: 0,
        name,
        age,
        income_range,
        investment_amount,
        time_horizon: time_horizon.as_str().to_string(),
        risk_tolerance: risk_tolerance.as_str().to_string(),
        investment_goals: goals
            .iter()
            .map(|g| g.label())
            .collect::<Vec<_>>()
            .join(", "),
        experience: experience.as_str().to_string(),
    })
}

fn recommend_response(recommendation: &Recommendation) -> RecommendResponse {
    RecommendResponse {
        risk_score: (recommendation.risk_score * 100.0).round() / 100.0,
        risk_tolerance_original: recommendation.risk_tolerance.as_str(),
        recommended_portfolio: recommendation
            .allocation
            .iter()
            .map(|entry| PortfolioHolding {
                symbol: entry.symbol,
                name: entry.name,
                category: entry.category,
                allocation: entry.weight_percent,
                investment_amount: entry.dollar_amount,
            })
            .collect(),
        projections: recommendation.projections.clone(),
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(AppState::default());

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("advisor API listening on http://{addr}");

    axum::serve(listener, app).await
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/recommend", post(recommend_handler))
        .route("/onboard", post(onboard_handler))
        .route(
            "/onboard/:id",
            get(fetch_onboard_handler).delete(delete_onboard_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn recommend_handler(Json(payload): Json<RecommendPayload>) -> Response {
    let request = match recommend_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let factors = RiskFactors {
        age: request.age,
        annual_income: request.income,
        investment_amount: request.investment_amount,
        time_horizon: request.time_horizon,
        risk_tolerance: &request.risk_tolerance,
        experience: request.experience,
    };

    match recommend(&factors, request.policy) {
        Ok(recommendation) => {
            tracing::info!(
                risk_score = recommendation.risk_score,
                tier = recommendation.risk_tolerance.as_str(),
                "recommendation generated"
            );
            json_response(StatusCode::OK, recommend_response(&recommendation))
        }
        Err(err) => {
            tracing::warn!(tier = %err.tier, "rejected recommendation request");
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
    }
}

async fn onboard_handler(
    State(state): State<AppState>,
    Json(payload): Json<OnboardPayload>,
) -> Response {
    let record = match onboard_record_from_payload(payload) {
        Ok(record) => record,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let profile_id = state
        .profiles
        .lock()
        .expect("profile table lock poisoned")
        .insert(record);
    tracing::info!(profile_id, "profile stored");
    json_response(
        StatusCode::CREATED,
        OnboardCreated {
            status: "ok",
            profile_id,
        },
    )
}

async fn fetch_onboard_handler(
    State(state): State<AppState>,
    Path(profile_id): Path<u64>,
) -> Response {
    let profile = state
        .profiles
        .lock()
        .expect("profile table lock poisoned")
        .get(profile_id);
    match profile {
        Some(profile) => json_response(StatusCode::OK, profile),
        None => error_response(StatusCode::NOT_FOUND, "Profile not found"),
    }
}

async fn delete_onboard_handler(
    State(state): State<AppState>,
    Path(profile_id): Path<u64>,
) -> Response {
    let removed = state
        .profiles
        .lock()
        .expect("profile table lock poisoned")
        .remove(profile_id);
    if removed {
        json_response(
            StatusCode::OK,
            OnboardDeleted {
                status: "deleted",
                profile_id,
            },
        )
    } else {
        error_response(StatusCode::NOT_FOUND, "Profile not found")
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (status, Json(body)).into_response()
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
