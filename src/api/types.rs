//! Wire types for the prediction service.

use serde::{Deserialize, Serialize};

/// Request body for `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response body from `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Whether a feature pushes the prediction up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increases,
    Decreases,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Increases => write!(f, "increases"),
            Self::Decreases => write!(f, "decreases"),
        }
    }
}

/// One reason code attached to a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reason {
    pub feature: String,
    pub impact: f64,
    pub direction: Direction,
}

/// Response body from `POST /predict`.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionResult {
    pub churn_probability: f64,
    #[serde(default)]
    pub top_reasons: Vec<Reason>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// One fully explained row of a batch upload.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryExample {
    pub row_index: i64,
    pub churn_probability: f64,
    pub risk: String,
    #[serde(default)]
    pub top_reasons: Vec<Reason>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Response body from `POST /predict_batch`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchResult {
    #[serde(default)]
    pub summary_examples: Vec<SummaryExample>,
    /// Scored rows; column order is whatever the server emitted.
    #[serde(default)]
    pub preview_rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// One entry of `GET /insights`.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Response body from `GET /insights`.
#[derive(Debug, Clone, Deserialize)]
pub struct InsightsResult {
    #[serde(default)]
    pub top_features: Vec<FeatureImportance>,
}

/// Response body from `GET /ping`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResult {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}
