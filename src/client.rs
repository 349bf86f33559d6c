use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{Profile, ProfileSubmitter, SubmissionError};

const SUBMIT_TIMEOUT_SECS: u64 = 30;
const SUBMIT_PATH: &str = "/onboard";

#[derive(Debug, Clone)]
pub struct HttpProfileSubmitter {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpProfileSubmitter {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SubmissionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(SUBMIT_TIMEOUT_SECS))
            .build()
            .map_err(|e| SubmissionError {
                message: format!("failed to build submission client: {e}"),
            })?;
        let base = base_url.into();
        Ok(HttpProfileSubmitter {
            http,
            endpoint: format!("{}{SUBMIT_PATH}", base.trim_end_matches('/')),
        })
    }
}

#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    name: &'a str,
    age: u32,
    income_range: &'a str,
    investment_amount: f64,
    time_horizon: &'a str,
    risk_tolerance: &'a str,
    investment_goals: String,
    experience: &'a str,
}

fn submit_body(profile: &Profile) -> SubmitBody<'_> {
    SubmitBody {
        name: &profile.name,
        age: profile.age,
        income_range: profile.income_range,
        investment_amount: profile.investment_amount,
        time_horizon: profile.time_horizon.as_str(),
        risk_tolerance: profile.risk_tolerance.as_str(),
        investment_goals: profile
            .goals
            .iter()
            .map(|g| g.label())
            .collect::<Vec<_>>()
            .join(", "),
        experience: profile.experience.as_str(),
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[async_trait]
impl ProfileSubmitter for HttpProfileSubmitter {
    async fn submit(&self, profile: &Profile) -> Result<(), SubmissionError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&submit_body(profile))
            .send()
            .await
            .map_err(|e| SubmissionError {
                message: format!("profile submission failed: {e}"),
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(%status, "profile submitted");
            return Ok(());
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("profile submission failed with status {status}"),
        };
        tracing::warn!(%status, %message, "profile submission rejected");
        Err(SubmissionError { message })
    }
}
