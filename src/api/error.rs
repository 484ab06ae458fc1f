//! Error taxonomy for calls against the prediction service.
//!
//! Every failure is terminal for the action that triggered it. The variants
//! only exist so the user gets a message that matches what actually went
//! wrong; none of them is retried.

use thiserror::Error;

/// A failed request against the prediction API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server refused the credential (HTTP 401/403) or none was sent.
    #[error("not authenticated (HTTP {status})")]
    Unauthenticated { status: u16 },

    /// The server rejected the request payload.
    #[error("request rejected (HTTP {status}): {detail}")]
    Validation { status: u16, detail: String },

    /// The server failed while handling a well-formed request.
    #[error("server error (HTTP {status}): {detail}")]
    Server { status: u16, detail: String },

    /// Any other non-success status.
    #[error("unexpected HTTP status {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The request never produced an HTTP response.
    #[error("could not reach the prediction service: {0}")]
    Transport(String),

    /// A success status came back with a body we could not read.
    #[error("malformed response from the prediction service: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify a non-success HTTP status and its response body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = extract_detail(body);
        match status {
            401 | 403 => Self::Unauthenticated { status },
            400 | 404 | 413 | 415 | 422 => Self::Validation { status, detail },
            500..=599 => Self::Server { status, detail },
            _ => Self::Status { status, detail },
        }
    }

    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthenticated { status }
            | Self::Validation { status, .. }
            | Self::Server { status, .. }
            | Self::Status { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }

    /// Short machine-readable name, used in the activity log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated { .. } => "unauthenticated",
            Self::Validation { .. } => "validation",
            Self::Server { .. } => "server",
            Self::Status { .. } => "status",
            Self::Transport(_) => "transport",
            Self::Decode(_) => "decode",
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// FastAPI-style bodies carry `{"detail": ...}` where detail is either a
/// string or a structured list of validation problems.
fn extract_detail(body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed)
        && let Some(detail) = value.get("detail")
    {
        return match detail {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
    }
    if trimmed.is_empty() {
        "no details".to_string()
    } else {
        trimmed.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
