//! View models for prediction results.
//!
//! Everything here is a pure transformation from a service response to the
//! data a screen shows. Nothing in this module touches the terminal;
//! [`terminal`] binds these view models to actual output.

pub mod terminal;

use serde::Serialize;

use crate::api::types::{
    BatchResult, FeatureImportance, InsightsResult, PredictionResult, Reason, SummaryExample,
};

/// Probability at or above which a customer is high risk.
pub const HIGH_RISK_THRESHOLD: f64 = 0.65;

/// Probability at or above which a customer is medium risk.
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.40;

/// Format a probability as a percentage with one decimal, e.g. `"72.0%"`.
pub fn format_pct(probability: f64) -> String {
    format!("{:.1}%", 100.0 * probability)
}

// ---------------------------------------------------------------------------
// Risk tiers
// ---------------------------------------------------------------------------

/// Churn risk bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Bucket a probability. Values that are not comparable land in `Low`.
    pub fn classify(probability: f64) -> Self {
        if probability >= HIGH_RISK_THRESHOLD {
            Self::High
        } else if probability >= MEDIUM_RISK_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Reason bars
// ---------------------------------------------------------------------------

/// Bar widths (percent, 0–100) for a list of reasons, in input order.
///
/// Each width is `round(100 * |impact| / d)` where `d` is the largest
/// absolute impact, or 1 when every impact is zero.
pub fn bar_widths(reasons: &[Reason]) -> Vec<u8> {
    let largest = reasons
        .iter()
        .map(|r| r.impact.abs())
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    let denominator = if largest > 0.0 { largest } else { 1.0 };

    reasons
        .iter()
        .map(|r| {
            let width = (100.0 * r.impact.abs() / denominator).round();
            if width.is_finite() {
                width.clamp(0.0, 100.0) as u8
            } else {
                0
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Single prediction
// ---------------------------------------------------------------------------

/// One reason line with its bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasonView {
    /// `feature (direction)`
    pub label: String,
    pub feature: String,
    pub impact: f64,
    pub bar_width: u8,
}

/// Everything the single-prediction panel shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionView {
    pub probability: f64,
    pub probability_text: String,
    pub risk: RiskTier,
    pub reasons: Vec<ReasonView>,
    pub recommendations: Vec<String>,
}

impl PredictionView {
    pub fn from_result(result: &PredictionResult) -> Self {
        let widths = bar_widths(&result.top_reasons);
        let reasons = result
            .top_reasons
            .iter()
            .zip(widths)
            .map(|(reason, bar_width)| ReasonView {
                label: format!("{} ({})", reason.feature, reason.direction),
                feature: reason.feature.clone(),
                impact: reason.impact,
                bar_width,
            })
            .collect();

        Self {
            probability: result.churn_probability,
            probability_text: format_pct(result.churn_probability),
            risk: RiskTier::classify(result.churn_probability),
            reasons,
            recommendations: result.recommendations.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Batch prediction
// ---------------------------------------------------------------------------

/// One summary card of a batch upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryCard {
    /// `Row N`
    pub title: String,
    pub probability_text: String,
    /// Risk label exactly as the server reported it.
    pub risk: String,
    /// Reason features joined with `", "`.
    pub reasons: String,
    /// Recommendations joined with `"; "`.
    pub actions: String,
}

impl SummaryCard {
    fn from_example(example: &SummaryExample) -> Self {
        Self {
            title: format!("Row {}", example.row_index),
            probability_text: format_pct(example.churn_probability),
            risk: example.risk.clone(),
            reasons: example
                .top_reasons
                .iter()
                .map(|r| r.feature.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            actions: example.recommendations.join("; "),
        }
    }
}

/// Tabular preview of scored rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl PreviewTable {
    /// Build a table whose columns are the keys of the first row.
    ///
    /// Later rows are assumed to share those columns; a key they lack
    /// renders as an empty cell and extra keys are ignored. Returns `None`
    /// for an empty preview.
    pub fn from_rows(rows: &[serde_json::Map<String, serde_json::Value>]) -> Option<Self> {
        let first = rows.first()?;
        let columns: Vec<String> = first.keys().cloned().collect();
        let rows = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| row.get(c).map(cell_text).unwrap_or_default())
                    .collect()
            })
            .collect();
        Some(Self { columns, rows })
    }
}

/// Text of one preview cell. Strings are shown without quotes.
fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Everything the batch panel shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchView {
    pub examples: Vec<SummaryCard>,
    /// `None` keeps the table area hidden.
    pub preview: Option<PreviewTable>,
}

impl BatchView {
    pub fn from_result(result: &BatchResult) -> Self {
        Self {
            examples: result
                .summary_examples
                .iter()
                .map(SummaryCard::from_example)
                .collect(),
            preview: PreviewTable::from_rows(&result.preview_rows),
        }
    }
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

/// Global feature importances, one line each, in server order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightsView {
    pub lines: Vec<String>,
}

impl InsightsView {
    pub fn from_result(result: &InsightsResult) -> Self {
        Self {
            lines: result.top_features.iter().map(insight_line).collect(),
        }
    }
}

fn insight_line(feature: &FeatureImportance) -> String {
    format!("{}: {:.4}", feature.feature, feature.importance)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
