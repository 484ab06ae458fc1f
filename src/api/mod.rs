/// HTTP client for the churn prediction service.
///
/// Communicates with the service using the synchronous `ureq` client. One
/// call is one round trip: there is no retry, no token refresh and no
/// queuing. The bearer credential is passed in by the caller on every call
/// and forwarded untouched as `Authorization: Bearer <token>`; without a
/// credential the header is omitted entirely.
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;

pub mod error;
pub mod multipart;
pub mod types;

pub use error::ApiError;
use multipart::Multipart;
use types::{
    BatchResult, InsightsResult, LoginRequest, LoginResponse, PingResult, PredictionResult,
};

use crate::activity::ActivityLog;
use crate::config::ChurnConfig;

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

pub const LOGIN_PATH: &str = "/auth/login";
pub const PREDICT_PATH: &str = "/predict";
pub const PREDICT_BATCH_PATH: &str = "/predict_batch";
pub const INSIGHTS_PATH: &str = "/insights";
pub const PING_PATH: &str = "/ping";

/// User-facing action name for an endpoint path, as written to the activity log.
pub fn endpoint_action(path: &str) -> &'static str {
    match path {
        LOGIN_PATH => "login",
        PREDICT_PATH => "predict",
        PREDICT_BATCH_PATH => "batch",
        INSIGHTS_PATH => "insights",
        PING_PATH => "ping",
        _ => "other",
    }
}

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Request payload.
#[derive(Debug, Clone, Copy)]
pub enum Body<'a> {
    Empty,
    Json(&'a serde_json::Value),
    Multipart(&'a Multipart),
}

/// Build the `Authorization` header value for an optional credential.
pub fn authorization_header(credential: Option<&str>) -> Option<String> {
    credential.map(|token| format!("Bearer {token}"))
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous client bound to one API base address.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    agent: ureq::Agent,
    activity: ActivityLog,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            activity: ActivityLog::disabled(),
        }
    }

    /// Build a client from the resolved config, logging to its activity log.
    pub fn from_config(config: &ChurnConfig) -> Self {
        Self::new(
            &config.api.base_url,
            Duration::from_millis(config.api.timeout_ms),
        )
        .with_activity(ActivityLog::from_config(config))
    }

    pub fn with_activity(mut self, activity: ActivityLog) -> Self {
        self.activity = activity;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Issue one request and return the successful response.
    ///
    /// Any non-2xx status is classified into an [`ApiError`]; the response
    /// body is consumed to extract the server's detail message.
    pub fn send(
        &self,
        method: Method,
        path: &str,
        body: Body<'_>,
        credential: Option<&str>,
    ) -> Result<ureq::Response, ApiError> {
        let start = Instant::now();
        let outcome = self.dispatch(method, path, body, credential);
        let status = match &outcome {
            Ok(response) => Some(response.status()),
            Err(err) => err.status(),
        };
        self.record(method, path, status, outcome.as_ref().err(), credential, start);
        outcome
    }

    /// Issue a request and decode the JSON response body.
    ///
    /// The call is logged once the body has been decoded, so a 2xx response
    /// that fails to parse is recorded as a `decode` failure.
    fn send_for<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Body<'_>,
        credential: Option<&str>,
    ) -> Result<T, ApiError> {
        let start = Instant::now();
        let (status, outcome) = match self.dispatch(method, path, body, credential) {
            Ok(response) => {
                let status = response.status();
                let decoded = response
                    .into_json::<T>()
                    .map_err(|e| ApiError::Decode(e.to_string()));
                (Some(status), decoded)
            }
            Err(err) => (err.status(), Err(err)),
        };
        self.record(method, path, status, outcome.as_ref().err(), credential, start);
        outcome
    }

    fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Body<'_>,
        credential: Option<&str>,
    ) -> Result<ureq::Response, ApiError> {
        let mut request = self.agent.request(method.as_str(), &self.url(path));
        if let Some(header) = authorization_header(credential) {
            request = request.set("Authorization", &header);
        }

        let result = match body {
            Body::Empty => request.call(),
            Body::Json(value) => request.send_json(value),
            Body::Multipart(form) => {
                let (content_type, bytes) = form.clone().finish();
                request.set("Content-Type", &content_type).send_bytes(&bytes)
            }
        };

        match result {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(status, response)) => {
                let text = response.into_string().unwrap_or_default();
                Err(ApiError::from_status(status, &text))
            }
            Err(ureq::Error::Transport(transport)) => Err(ApiError::Transport(transport.to_string())),
        }
    }

    fn record(
        &self,
        method: Method,
        path: &str,
        status: Option<u16>,
        error: Option<&ApiError>,
        credential: Option<&str>,
        start: Instant,
    ) {
        self.activity.record(
            endpoint_action(path),
            method.as_str(),
            path,
            status,
            error.map(ApiError::kind),
            credential.is_some(),
            start.elapsed().as_millis() as u64,
        );
    }

    // -----------------------------------------------------------------------
    // Endpoints
    // -----------------------------------------------------------------------

    /// `POST /auth/login`.
    pub fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let payload = serde_json::to_value(LoginRequest { username, password })
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        self.send_for(Method::Post, LOGIN_PATH, Body::Json(&payload), None)
    }

    /// `POST /predict` with an already-coerced record.
    pub fn predict(
        &self,
        record: &serde_json::Value,
        credential: Option<&str>,
    ) -> Result<PredictionResult, ApiError> {
        self.send_for(Method::Post, PREDICT_PATH, Body::Json(record), credential)
    }

    /// `POST /predict_batch` with the CSV bytes as multipart field `file`.
    pub fn predict_batch(
        &self,
        filename: &str,
        csv: &[u8],
        credential: Option<&str>,
    ) -> Result<BatchResult, ApiError> {
        let form = Multipart::new().file("file", filename, "text/csv", csv);
        self.send_for(
            Method::Post,
            PREDICT_BATCH_PATH,
            Body::Multipart(&form),
            credential,
        )
    }

    /// `GET /insights`.
    pub fn insights(&self, credential: Option<&str>) -> Result<InsightsResult, ApiError> {
        self.send_for(Method::Get, INSIGHTS_PATH, Body::Empty, credential)
    }

    /// `GET /ping`. Needs no credential.
    pub fn ping(&self) -> Result<PingResult, ApiError> {
        self.send_for(Method::Get, PING_PATH, Body::Empty, None)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
