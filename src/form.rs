//! Form input for the login and prediction actions.
//!
//! A [`Form`] is an ordered set of named text fields gathered from
//! `KEY=VALUE` arguments and/or a JSON object file. Required fields are
//! looked up explicitly and a missing one is a named error, never a
//! silent null.

use std::fs;
use std::path::Path;

use thiserror::Error;

/// Fields of a prediction record that the service expects as numbers.
pub const NUMERIC_FIELDS: [&str; 4] = ["SeniorCitizen", "tenure", "MonthlyCharges", "TotalCharges"];

/// A form that could not be turned into a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("field not found: '{0}'")]
    FieldNotFound(String),

    #[error("field '{field}' must be numeric, got '{value}'")]
    NotNumeric { field: String, value: String },

    #[error("expected KEY=VALUE, got '{0}'")]
    MalformedPair(String),

    #[error("could not read form input {path}: {message}")]
    Input { path: String, message: String },
}

/// Ordered text fields, the way a submitted HTML form presents them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    fields: Vec<(String, String)>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an earlier value with the same name in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Parse repeated `KEY=VALUE` arguments. Only the first `=` splits.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, FormError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut form = Self::new();
        form.extend_pairs(pairs)?;
        Ok(form)
    }

    pub fn extend_pairs<I, S>(&mut self, pairs: I) -> Result<(), FormError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pair in pairs {
            let pair = pair.as_ref();
            let Some((key, value)) = pair.split_once('=') else {
                return Err(FormError::MalformedPair(pair.to_string()));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(FormError::MalformedPair(pair.to_string()));
            }
            self.set(key, value);
        }
        Ok(())
    }

    /// Load fields from a JSON object. Scalar values are taken as their text.
    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let object: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(json).map_err(|e| e.to_string())?;

        let mut form = Self::new();
        for (key, value) in object {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                serde_json::Value::Bool(_) | serde_json::Value::Number(_) => value.to_string(),
                _ => return Err(format!("field '{key}' must be a scalar value")),
            };
            form.set(key, text);
        }
        Ok(form)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, FormError> {
        let input_err = |message: String| FormError::Input {
            path: path.display().to_string(),
            message,
        };
        let content = fs::read_to_string(path).map_err(|e| input_err(e.to_string()))?;
        Self::from_json_str(&content).map_err(input_err)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a field that must be present.
    pub fn require(&self, name: &str) -> Result<&str, FormError> {
        self.get(name)
            .ok_or_else(|| FormError::FieldNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// All fields as a JSON object of strings, in form order.
    pub fn to_json(&self) -> serde_json::Value {
        let object = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(object)
    }

    /// Build the `/predict` payload: [`NUMERIC_FIELDS`] become numbers,
    /// every other field stays a string.
    pub fn to_prediction_record(&self) -> Result<serde_json::Value, FormError> {
        let mut record = self.to_json();
        for field in NUMERIC_FIELDS {
            let raw = self.require(field)?;
            let number = parse_number(field, raw)?;
            record[field] = number;
        }
        Ok(record)
    }
}

/// Parse a numeric field. Integral values become JSON integers.
fn parse_number(field: &str, raw: &str) -> Result<serde_json::Value, FormError> {
    let not_numeric = || FormError::NotNumeric {
        field: field.to_string(),
        value: raw.to_string(),
    };

    let trimmed = raw.trim();
    let value: f64 = trimmed.parse().map_err(|_| not_numeric())?;
    if !value.is_finite() {
        return Err(not_numeric());
    }

    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        Ok(serde_json::Value::from(value as i64))
    } else {
        serde_json::Number::from_f64(value)
            .map(serde_json::Value::Number)
            .ok_or_else(not_numeric)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
