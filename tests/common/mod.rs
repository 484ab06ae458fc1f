//! In-process stand-in for the prediction service.
//!
//! Serves canned responses with `tiny_http` on a random loopback port and
//! records every request it receives, so tests can assert on exactly what
//! the client put on the wire.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use churnctl::api::ApiClient;
use tiny_http::{Header, Response, Server};

/// One request as the mock server saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is not JSON")
    }
}

type Handler = Box<dyn Fn(&Recorded) -> (u16, String) + Send>;

/// Builder for a mock API.
#[derive(Default)]
pub struct MockApiBuilder {
    routes: Vec<(&'static str, &'static str, Handler)>,
}

impl MockApiBuilder {
    /// Always answer `method path` with the given status and body.
    pub fn route(self, method: &'static str, path: &'static str, status: u16, body: &str) -> Self {
        let body = body.to_string();
        self.route_with(method, path, move |_| (status, body.clone()))
    }

    /// Answer `method path` with a response computed from the request.
    pub fn route_with<F>(mut self, method: &'static str, path: &'static str, handler: F) -> Self
    where
        F: Fn(&Recorded) -> (u16, String) + Send + 'static,
    {
        self.routes.push((method, path, Box::new(handler)));
        self
    }

    pub fn start(self) -> MockApi {
        let server = Server::http("127.0.0.1:0").expect("failed to bind mock server");
        let addr = server
            .server_addr()
            .to_ip()
            .expect("mock server has no IP address");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);
        let routes = self.routes;

        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let header = |name: &'static str| {
                    request
                        .headers()
                        .iter()
                        .find(|h| h.field.equiv(name))
                        .map(|h| h.value.as_str().to_string())
                };
                let authorization = header("Authorization");
                let content_type = header("Content-Type");

                let mut body = Vec::new();
                let _ = request.as_reader().read_to_end(&mut body);

                let recorded = Recorded {
                    method: request.method().to_string(),
                    path: request.url().to_string(),
                    authorization,
                    content_type,
                    body,
                };

                let (status, text) = routes
                    .iter()
                    .find(|(m, p, _)| *m == recorded.method && *p == recorded.path)
                    .map(|(_, _, handler)| handler(&recorded))
                    .unwrap_or((404, r#"{"detail":"Not Found"}"#.to_string()));

                log.lock().unwrap().push(recorded);

                let response = Response::from_string(text)
                    .with_status_code(status)
                    .with_header(
                        Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                            .unwrap(),
                    );
                let _ = request.respond(response);
            }
        });

        MockApi {
            base_url: format!("http://{addr}"),
            requests,
        }
    }
}

/// A running mock service.
pub struct MockApi {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockApi {
    pub fn builder() -> MockApiBuilder {
        MockApiBuilder::default()
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Recorded {
        self.requests()
            .pop()
            .expect("mock server received no requests")
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url, Duration::from_secs(5))
    }
}

/// A fresh, not-yet-existing file path under the system temp dir.
pub fn temp_path(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("churnctl-it-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir.join("file")
}

pub const PREDICTION_JSON: &str = r#"{
    "churn_probability": 0.72,
    "risk": "High",
    "top_reasons": [
        {"feature": "tenure", "impact": -0.3, "direction": "decreases"},
        {"feature": "MonthlyCharges", "impact": 0.1, "direction": "increases"}
    ],
    "recommendations": ["Offer discount"]
}"#;

pub const INSIGHTS_JSON: &str = r#"{
    "top_features": [
        {"feature": "Contract_Month-to-month", "importance": 0.21875},
        {"feature": "tenure", "importance": 0.1}
    ]
}"#;
