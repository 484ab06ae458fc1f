//! The client controller.
//!
//! One [`Controller`] owns the session and the API client and exposes one
//! method per user action. Each method performs at most one network round
//! trip and returns either a view model ready for rendering or a typed
//! error. Nothing is retried.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::api::{ApiClient, ApiError};
use crate::form::{Form, FormError};
use crate::render::{BatchView, InsightsView, PredictionView};
use crate::session::{Session, StoreError, View};

/// Why a user action did not produce a result.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("Choose a CSV file first.")]
    NoFileSelected,

    #[error("could not read {path}: {message}")]
    Io { path: String, message: String },
}

/// Result of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The credential was stored and the application view is active.
    Accepted,
    /// The service refused the credentials; the login view stays active.
    Rejected,
}

/// Which action failed, for choosing a hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    Predict,
    Batch,
    Insights,
    Ping,
}

impl ClientError {
    /// A one-line suggestion for the user, keyed on what went wrong.
    pub fn hint(&self, action: Action) -> &'static str {
        match self {
            Self::Api(ApiError::Unauthenticated { .. }) => {
                "You are not logged in or your session expired. Run `churnctl login`."
            }
            Self::Api(ApiError::Validation { .. }) => match action {
                Action::Batch => "Check that the CSV has the expected columns.",
                _ => "Check the submitted fields.",
            },
            Self::Api(ApiError::Server { .. }) => match action {
                Action::Predict | Action::Batch | Action::Insights => {
                    "The service failed; its model artifacts may not be trained yet."
                }
                _ => "The service failed while handling the request.",
            },
            Self::Api(ApiError::Transport(_)) => {
                "Is the service running? Check `api.base_url` with `churnctl config show`."
            }
            Self::Api(ApiError::Status { .. } | ApiError::Decode(_)) => {
                "The service answered unexpectedly; check `api.base_url`."
            }
            Self::Form(_) => "Fix the input and submit again.",
            Self::Storage(_) => "Check permissions on the session file, or set `session.path`.",
            Self::NoFileSelected => "Pass the CSV path, e.g. `churnctl batch customers.csv`.",
            Self::Io { .. } => "Check the file path.",
        }
    }
}

/// Session-bound client for every user action.
pub struct Controller {
    session: Session,
    api: ApiClient,
}

impl Controller {
    pub fn new(session: Session, api: ApiClient) -> Self {
        Self { session, api }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn view(&self) -> View {
        self.session.view()
    }

    /// Submit the login form (`username`, `password`).
    ///
    /// A non-success HTTP status is a [`LoginOutcome::Rejected`], not an
    /// error; only failures that never produced a status are errors.
    pub fn login(&mut self, form: &Form) -> Result<LoginOutcome, ClientError> {
        let username = form.require("username")?;
        let password = form.require("password")?;

        match self.api.login(username, password) {
            Ok(response) if response.access_token.trim().is_empty() => Err(ApiError::Decode(
                "login response carried an empty access token".to_string(),
            )
            .into()),
            Ok(response) => {
                self.session.set_credential(response.access_token)?;
                Ok(LoginOutcome::Accepted)
            }
            Err(err) if err.status().is_some() => Ok(LoginOutcome::Rejected),
            Err(err) => Err(err.into()),
        }
    }

    /// Forget the credential. Later calls carry no authorization header.
    pub fn logout(&mut self) -> Result<View, ClientError> {
        Ok(self.session.clear_credential()?)
    }

    /// Score a single customer record.
    pub fn predict(&self, form: &Form) -> Result<PredictionView, ClientError> {
        let record = form.to_prediction_record()?;
        let result = self.api.predict(&record, self.session.credential())?;
        Ok(PredictionView::from_result(&result))
    }

    /// Upload a CSV for batch scoring. Without a file, nothing is sent.
    ///
    /// Cell values are uploaded verbatim; the client does not coerce types
    /// in the CSV path.
    pub fn predict_batch(&self, file: Option<&Path>) -> Result<BatchView, ClientError> {
        let path = file.ok_or(ClientError::NoFileSelected)?;
        let csv = fs::read(path).map_err(|e| ClientError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_string());

        let result = self
            .api
            .predict_batch(&filename, &csv, self.session.credential())?;
        Ok(BatchView::from_result(&result))
    }

    /// Fetch the model's global feature importances.
    pub fn insights(&self) -> Result<InsightsView, ClientError> {
        let result = self.api.insights(self.session.credential())?;
        Ok(InsightsView::from_result(&result))
    }

    /// Check that the service is up.
    pub fn ping(&self) -> Result<crate::api::types::PingResult, ClientError> {
        Ok(self.api.ping()?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
