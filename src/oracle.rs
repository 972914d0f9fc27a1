//! Client for the external risk-assessment service.
//!
//! The service is a replaceable scoring source whose result is
//! interchangeable with the local scorer's output. One request per call;
//! callers own retry, supersession ("last request wins") and the fallback
//! policy below.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::CoreError;

/// Wire shape shared by both assessment endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub risk_score: f64,
    pub message: String,
}

/// Body of `POST /api/portfolio-risk-assessment`: currency values per
/// application asset bucket plus the portfolio total.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioComposition {
    pub stocks: f64,
    pub gold: f64,
    pub fixed_deposit: f64,
    pub bonds: f64,
    pub mutual_funds: f64,
    pub total_value: f64,
}

pub struct OracleClient {
    base_url: String,
    http: reqwest::Client,
}

impl OracleClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/risk-assessment[?risk_score=prior]`.
    pub async fn risk_assessment(&self, prior: Option<f64>) -> Result<Assessment, CoreError> {
        let url = match prior {
            Some(score) => format!("{}/api/risk-assessment?risk_score={score}", self.base_url),
            None => format!("{}/api/risk-assessment", self.base_url),
        };
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;
        response.json::<Assessment>().await.map_err(unavailable)
    }

    /// `POST /api/portfolio-risk-assessment`.
    pub async fn portfolio_risk_assessment(
        &self,
        composition: &PortfolioComposition,
    ) -> Result<Assessment, CoreError> {
        let url = format!("{}/api/portfolio-risk-assessment", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(composition)
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;
        response.json::<Assessment>().await.map_err(unavailable)
    }
}

fn unavailable(err: reqwest::Error) -> CoreError {
    CoreError::OracleUnavailable(err.to_string())
}

/// The documented fallback when the service cannot be reached: a uniformly
/// random whole score in [1, 10] plus an advisory message. A placeholder
/// policy carried over from the original service contract, not a sound
/// default; it is always paired with an advisory flag for the caller.
pub fn fallback_assessment(rng: &mut impl Rng) -> Assessment {
    Assessment {
        risk_score: rng.random_range(1..=10) as f64,
        message: "Could not reach the risk-assessment service. Using a fallback score."
            .to_string(),
    }
}
