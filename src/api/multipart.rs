//! Minimal `multipart/form-data` encoder for file uploads.
//!
//! `ureq` sends raw bytes, so the body and its boundary are built here. Only
//! file parts are needed: the batch endpoint takes a single `file` field.

use chrono::Utc;

/// An encoded multipart body together with the boundary it uses.
#[derive(Debug, Clone)]
pub struct Multipart {
    boundary: String,
    body: Vec<u8>,
}

impl Multipart {
    /// Start a new body with a boundary derived from the current time.
    pub fn new() -> Self {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        Self::with_boundary(format!("churnctl-{nanos:x}-{:x}", std::process::id()))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            body: Vec::new(),
        }
    }

    /// Append a file part.
    pub fn file(mut self, field: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        let header = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            self.boundary,
            escape_quoted(field),
            escape_quoted(filename),
            content_type,
        );
        self.body.extend_from_slice(header.as_bytes());
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Close the body and return its bytes.
    pub fn finish(mut self) -> (String, Vec<u8>) {
        let content_type = self.content_type();
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (content_type, self.body)
    }
}

impl Default for Multipart {
    fn default() -> Self {
        Self::new()
    }
}

/// Quoted-string values may not contain raw quotes or line breaks.
fn escape_quoted(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace(['\r', '\n'], " ")
}
