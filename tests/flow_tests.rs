/// End-to-end tests for the client controller against a mock service.
///
/// Each test starts its own `tiny_http` server on a random port, drives one
/// or more user actions through [`Controller`], and checks both what was
/// rendered and what went over the wire.
mod common;

use std::fs;
use std::path::Path;

use churnctl::activity::ActivityLog;
use churnctl::api::ApiError;
use churnctl::controller::{Action, ClientError, Controller, LoginOutcome};
use churnctl::form::Form;
use churnctl::render::RiskTier;
use churnctl::session::{CredentialStore, FileStore, MemoryStore, STORAGE_KEY, Session, View};

use common::{INSIGHTS_JSON, MockApi, PREDICTION_JSON, temp_path};

fn controller_with(api: &MockApi, store: impl CredentialStore + 'static) -> Controller {
    Controller::new(Session::init(store).unwrap(), api.client())
}

fn login_form(username: &str, password: &str) -> Form {
    let mut form = Form::new();
    form.set("username", username);
    form.set("password", password);
    form
}

fn prediction_form() -> Form {
    Form::from_pairs([
        "gender=Female",
        "SeniorCitizen=1",
        "Partner=Yes",
        "tenure=12",
        "Contract=Month-to-month",
        "MonthlyCharges=70.35",
        "TotalCharges=844.20",
    ])
    .unwrap()
}

// ---------------------------------------------------------------------------
// Login / logout
// ---------------------------------------------------------------------------

#[test]
fn login_persists_token_and_authenticates_next_call() {
    let api = MockApi::builder()
        .route_with("POST", "/auth/login", |req| {
            let body = req.body_json();
            if body["username"] == "admin" && body["password"] == "admin123" {
                (200, r#"{"access_token":"abc","token_type":"bearer"}"#.to_string())
            } else {
                (401, r#"{"detail":"Invalid credentials"}"#.to_string())
            }
        })
        .route("GET", "/insights", 200, INSIGHTS_JSON)
        .start();

    let session_path = temp_path("login");
    let mut controller = controller_with(&api, FileStore::new(&session_path));
    assert_eq!(controller.view(), View::Login);

    let outcome = controller.login(&login_form("admin", "admin123")).unwrap();
    assert_eq!(outcome, LoginOutcome::Accepted);
    assert_eq!(controller.view(), View::Application);

    let login_request = api.last_request();
    assert_eq!(login_request.authorization, None);
    assert_eq!(
        login_request.content_type.as_deref(),
        Some("application/json")
    );

    let persisted: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&session_path).unwrap()).unwrap();
    assert_eq!(persisted[STORAGE_KEY], "abc");

    controller.insights().unwrap();
    assert_eq!(api.last_request().authorization.as_deref(), Some("Bearer abc"));

    // A fresh process reads the persisted token and starts authenticated.
    let reloaded = controller_with(&api, FileStore::new(&session_path));
    assert_eq!(reloaded.view(), View::Application);
    reloaded.insights().unwrap();
    assert_eq!(api.last_request().authorization.as_deref(), Some("Bearer abc"));
}

#[test]
fn rejected_login_stays_on_login_view() {
    let api = MockApi::builder()
        .route("POST", "/auth/login", 401, r#"{"detail":"Invalid credentials"}"#)
        .start();

    let store = MemoryStore::new();
    let mut controller = controller_with(&api, store.clone());

    let outcome = controller.login(&login_form("admin", "wrong")).unwrap();
    assert_eq!(outcome, LoginOutcome::Rejected);
    assert_eq!(controller.view(), View::Login);
    assert_eq!(store.load().unwrap(), None);
    assert_eq!(api.requests().len(), 1);
}

#[test]
fn empty_access_token_is_not_stored() {
    let api = MockApi::builder()
        .route("POST", "/auth/login", 200, r#"{"access_token":"","token_type":"bearer"}"#)
        .start();

    let store = MemoryStore::new();
    let mut controller = controller_with(&api, store.clone());

    let err = controller.login(&login_form("admin", "admin123")).unwrap_err();
    assert!(matches!(err, ClientError::Api(ApiError::Decode(_))));
    assert_eq!(controller.view(), View::Login);
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn logout_removes_authorization_header() {
    let api = MockApi::builder()
        .route_with("GET", "/insights", |req| match req.authorization {
            Some(_) => (200, INSIGHTS_JSON.to_string()),
            None => (401, r#"{"detail":"Not authenticated"}"#.to_string()),
        })
        .start();

    let store = MemoryStore::with_token("abc");
    let mut controller = controller_with(&api, store.clone());
    controller.insights().unwrap();
    assert_eq!(api.last_request().authorization.as_deref(), Some("Bearer abc"));

    assert_eq!(controller.logout().unwrap(), View::Login);
    assert_eq!(store.load().unwrap(), None);

    let err = controller.insights().unwrap_err();
    assert!(matches!(
        err,
        ClientError::Api(ApiError::Unauthenticated { status: 401 })
    ));
    assert_eq!(api.last_request().authorization, None);
}

// ---------------------------------------------------------------------------
// Single prediction
// ---------------------------------------------------------------------------

#[test]
fn predict_sends_coerced_record_and_renders_result() {
    let api = MockApi::builder()
        .route("POST", "/predict", 200, PREDICTION_JSON)
        .start();
    let controller = controller_with(&api, MemoryStore::with_token("abc"));

    let view = controller.predict(&prediction_form()).unwrap();

    let request = api.last_request();
    assert_eq!(request.authorization.as_deref(), Some("Bearer abc"));
    let body = request.body_json();
    assert_eq!(body["SeniorCitizen"], 1);
    assert_eq!(body["tenure"], 12);
    assert_eq!(body["MonthlyCharges"], 70.35);
    assert_eq!(body["TotalCharges"], 844.2);
    assert_eq!(body["gender"], "Female");
    assert_eq!(body["Partner"], "Yes");

    assert_eq!(view.probability_text, "72.0%");
    assert_eq!(view.risk, RiskTier::High);
    let widths: Vec<u8> = view.reasons.iter().map(|r| r.bar_width).collect();
    assert_eq!(widths, vec![100, 33]);
    assert_eq!(view.reasons[0].label, "tenure (decreases)");
    assert_eq!(view.recommendations, vec!["Offer discount"]);
}

#[test]
fn predict_server_failure_points_at_model_artifacts() {
    let api = MockApi::builder()
        .route("POST", "/predict", 500, "Internal Server Error")
        .start();
    let controller = controller_with(&api, MemoryStore::with_token("abc"));

    let err = controller.predict(&prediction_form()).unwrap_err();
    assert!(matches!(err, ClientError::Api(ApiError::Server { status: 500, .. })));
    assert!(err.hint(Action::Predict).contains("artifacts"));
}

#[test]
fn predict_with_invalid_form_sends_nothing() {
    let api = MockApi::builder()
        .route("POST", "/predict", 200, PREDICTION_JSON)
        .start();
    let controller = controller_with(&api, MemoryStore::with_token("abc"));

    let mut form = prediction_form();
    form.set("tenure", "a year");
    assert!(matches!(
        controller.predict(&form).unwrap_err(),
        ClientError::Form(_)
    ));
    assert!(api.requests().is_empty());
}

// ---------------------------------------------------------------------------
// Batch prediction
// ---------------------------------------------------------------------------

#[test]
fn batch_without_file_sends_nothing() {
    let api = MockApi::builder()
        .route("POST", "/predict_batch", 200, "{}")
        .start();
    let controller = controller_with(&api, MemoryStore::with_token("abc"));

    let err = controller.predict_batch(None).unwrap_err();
    assert!(matches!(err, ClientError::NoFileSelected));
    assert!(api.requests().is_empty());
}

#[test]
fn batch_uploads_multipart_and_hides_empty_preview() {
    let api = MockApi::builder()
        .route(
            "POST",
            "/predict_batch",
            200,
            r#"{
                "summary_examples": [{
                    "row_index": 0, "churn_probability": 0.455, "risk": "Medium",
                    "top_reasons": [{"feature": "tenure", "impact": 0.2, "direction": "increases"}],
                    "recommendations": ["Offer loyalty bonus", "Review pricing"]
                }],
                "preview_rows": []
            }"#,
        )
        .start();
    let controller = controller_with(&api, MemoryStore::with_token("abc"));

    let csv_path = temp_path("batch").with_file_name("customers.csv");
    fs::write(&csv_path, "customerID,tenure,Churn\n7590-VHVEG,1,No\n").unwrap();

    let view = controller.predict_batch(Some(&csv_path)).unwrap();

    let request = api.last_request();
    assert_eq!(request.authorization.as_deref(), Some("Bearer abc"));
    let content_type = request.content_type.clone().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    let body = request.body_text();
    assert!(body.contains(r#"name="file"; filename="customers.csv""#));
    assert!(body.contains("7590-VHVEG,1,No"));

    assert_eq!(view.examples.len(), 1);
    assert_eq!(view.examples[0].title, "Row 0");
    assert_eq!(view.examples[0].probability_text, "45.5%");
    assert_eq!(view.examples[0].risk, "Medium");
    assert_eq!(view.examples[0].reasons, "tenure");
    assert_eq!(view.examples[0].actions, "Offer loyalty bonus; Review pricing");
    assert!(view.preview.is_none());
}

#[test]
fn batch_preview_uses_first_row_columns() {
    let api = MockApi::builder()
        .route(
            "POST",
            "/predict_batch",
            200,
            r#"{
                "summary_examples": [],
                "preview_rows": [
                    {"customerID": "A", "tenure": 1, "predicted_churn_probability": 0.9, "predicted_risk": "High"},
                    {"customerID": "B", "tenure": 40, "predicted_churn_probability": 0.1, "predicted_risk": "Low"}
                ]
            }"#,
        )
        .start();
    let controller = controller_with(&api, MemoryStore::with_token("abc"));

    let csv_path = temp_path("preview").with_file_name("rows.csv");
    fs::write(&csv_path, "customerID,tenure\nA,1\nB,40\n").unwrap();

    let view = controller.predict_batch(Some(Path::new(&csv_path))).unwrap();
    assert!(view.examples.is_empty());
    let table = view.preview.unwrap();
    assert_eq!(
        table.columns,
        vec!["customerID", "tenure", "predicted_churn_probability", "predicted_risk"]
    );
    assert_eq!(table.rows[1], vec!["B", "40", "0.1", "Low"]);
}

#[test]
fn batch_validation_error_carries_server_detail() {
    let api = MockApi::builder()
        .route(
            "POST",
            "/predict_batch",
            400,
            r#"{"detail":"Missing columns: ['Churn']"}"#,
        )
        .start();
    let controller = controller_with(&api, MemoryStore::with_token("abc"));

    let csv_path = temp_path("invalid").with_file_name("bad.csv");
    fs::write(&csv_path, "a,b\n1,2\n").unwrap();

    let err = controller.predict_batch(Some(&csv_path)).unwrap_err();
    assert!(err.to_string().contains("Missing columns"));
    assert!(err.hint(Action::Batch).contains("CSV"));
}

// ---------------------------------------------------------------------------
// Insights / ping
// ---------------------------------------------------------------------------

#[test]
fn insights_render_four_decimals_in_server_order() {
    let api = MockApi::builder()
        .route("GET", "/insights", 200, INSIGHTS_JSON)
        .start();
    let controller = controller_with(&api, MemoryStore::with_token("abc"));

    let view = controller.insights().unwrap();
    assert_eq!(
        view.lines,
        vec!["Contract_Month-to-month: 0.2188", "tenure: 0.1000"]
    );
    assert_eq!(api.last_request().method, "GET");
}

#[test]
fn ping_never_sends_credentials() {
    let api = MockApi::builder()
        .route("GET", "/ping", 200, r#"{"status":"ok","version":"v2"}"#)
        .start();
    let controller = controller_with(&api, MemoryStore::with_token("abc"));

    let pong = controller.ping().unwrap();
    assert_eq!(pong.status, "ok");
    assert_eq!(pong.version.as_deref(), Some("v2"));
    assert_eq!(api.last_request().authorization, None);
}

#[test]
fn malformed_success_body_is_a_decode_error() {
    let api = MockApi::builder()
        .route("GET", "/insights", 200, "<html>oops</html>")
        .start();
    let controller = controller_with(&api, MemoryStore::with_token("abc"));

    assert!(matches!(
        controller.insights().unwrap_err(),
        ClientError::Api(ApiError::Decode(_))
    ));
}

// ---------------------------------------------------------------------------
// Activity log
// ---------------------------------------------------------------------------

#[test]
fn activity_log_records_calls_without_the_token() {
    let api = MockApi::builder()
        .route("POST", "/predict", 200, PREDICTION_JSON)
        .route("GET", "/insights", 401, r#"{"detail":"Not authenticated"}"#)
        .route("GET", "/ping", 200, "<html>oops</html>")
        .start();

    let log_path = temp_path("activity").with_file_name("activity.jsonl");
    let client = api.client().with_activity(ActivityLog::at(&log_path));
    let session = Session::init(MemoryStore::with_token("super-secret")).unwrap();
    let controller = Controller::new(session, client);

    controller.predict(&prediction_form()).unwrap();
    let _ = controller.insights();
    let err = controller.ping().unwrap_err();
    assert!(matches!(err, ClientError::Api(ApiError::Decode(_))));

    let entries = ActivityLog::at(&log_path).read_all();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].action, "predict");
    assert_eq!(entries[0].path, "/predict");
    assert_eq!(entries[0].status, Some(200));
    assert!(entries[0].ok);
    assert!(entries[0].authenticated);
    assert_eq!(entries[1].status, Some(401));
    assert_eq!(entries[1].error_kind.as_deref(), Some("unauthenticated"));
    assert_eq!(entries[2].action, "ping");
    assert_eq!(entries[2].status, Some(200));
    assert!(!entries[2].ok);
    assert_eq!(entries[2].error_kind.as_deref(), Some("decode"));
    assert!(!entries[2].authenticated);

    let raw = fs::read_to_string(&log_path).unwrap();
    assert!(!raw.contains("super-secret"));
}
