//! Terminal output for view models.
//!
//! Each `print_*` function writes one panel in either table or JSON form.
//! The `*_lines` builders produce uncoloured text so the layout can be
//! tested without a terminal.

use anyhow::Result;
use colored::{ColoredString, Colorize};
use serde::Serialize;

use super::{BatchView, InsightsView, PredictionView, PreviewTable, RiskTier};
use crate::activity::ActivityEntry;
use crate::config::OutputFormat;

/// Character width of a 100% reason bar.
const BAR_CHARS: usize = 24;

/// Widest a preview cell may grow before it is truncated.
const MAX_CELL_WIDTH: usize = 24;

/// Style a risk label with its tier colour.
pub fn risk_badge(tier: RiskTier) -> ColoredString {
    let label = format!(" {} ", tier.label());
    match tier {
        RiskTier::High => label.white().on_red().bold(),
        RiskTier::Medium => label.black().on_yellow().bold(),
        RiskTier::Low => label.black().on_green().bold(),
    }
}

/// Style a server-provided risk label, falling back to plain text.
fn risk_text(label: &str) -> ColoredString {
    match label {
        "High" => label.red().bold(),
        "Medium" => label.yellow().bold(),
        "Low" => label.green().bold(),
        other => other.normal(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Single prediction
// ---------------------------------------------------------------------------

pub fn print_prediction(view: &PredictionView, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(view);
    }

    println!("{}", "Churn Prediction".bold().cyan());
    println!("{}", "=".repeat(50));
    println!(
        "  {} {}   {}",
        "Probability:".bold(),
        view.probability_text,
        risk_badge(view.risk)
    );
    println!();

    if !view.reasons.is_empty() {
        println!("{}", "Top Reasons".bold().cyan());
        let label_width = view
            .reasons
            .iter()
            .map(|r| r.label.chars().count())
            .max()
            .unwrap_or(0);
        for reason in &view.reasons {
            println!(
                "  {:<label_width$}  {} {:>3}%",
                reason.label,
                bar(reason.bar_width).blue(),
                reason.bar_width,
            );
        }
        println!();
    }

    if !view.recommendations.is_empty() {
        println!("{}", "Recommended Actions".bold().cyan());
        for action in &view.recommendations {
            println!("  - {action}");
        }
    }

    Ok(())
}

/// Fixed-width bar for a 0–100 percentage.
pub fn bar(width_pct: u8) -> String {
    let filled = (usize::from(width_pct.min(100)) * BAR_CHARS + 50) / 100;
    format!("{}{}", "█".repeat(filled), "·".repeat(BAR_CHARS - filled))
}

// ---------------------------------------------------------------------------
// Batch prediction
// ---------------------------------------------------------------------------

pub fn print_batch(view: &BatchView, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(view);
    }

    println!("{}", "Examples".bold().cyan());
    println!("{}", "=".repeat(50));
    if view.examples.is_empty() {
        println!("  {}", "No example rows returned.".dimmed());
    }
    for card in &view.examples {
        println!(
            "  {}: {} ({})",
            card.title.bold(),
            card.probability_text,
            risk_text(&card.risk)
        );
        println!("    Reasons: {}", card.reasons);
        println!("    Actions: {}", card.actions);
    }

    if let Some(table) = &view.preview {
        println!();
        println!(
            "{}",
            format!("Preview ({} rows)", table.rows.len()).bold().cyan()
        );
        for (i, line) in table_lines(table).into_iter().enumerate() {
            if i == 0 {
                println!("  {}", line.bold());
            } else if i % 2 == 0 {
                println!("  {}", line.dimmed());
            } else {
                println!("  {line}");
            }
        }
    }

    Ok(())
}

/// Header, separator and body lines of a preview table.
pub fn table_lines(table: &PreviewTable) -> Vec<String> {
    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            table
                .rows
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_CELL_WIDTH)
        })
        .collect();

    let render_row = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<w$}", truncate(cell, w)))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(table.rows.len() + 2);
    lines.push(render_row(&table.columns));
    lines.push(
        widths
            .iter()
            .map(|&w| "-".repeat(w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &table.rows {
        lines.push(render_row(row));
    }
    lines
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else if max <= 3 {
        s.chars().take(max).collect()
    } else {
        let head: String = s.chars().take(max - 3).collect();
        format!("{head}...")
    }
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

pub fn print_insights(view: &InsightsView, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(view);
    }

    for line in dialog_lines("Feature Insights", &view.lines) {
        println!("{line}");
    }
    Ok(())
}

/// Frame a list of lines as a dialog box.
pub fn dialog_lines(title: &str, body: &[String]) -> Vec<String> {
    let inner = body
        .iter()
        .map(|l| l.chars().count())
        .chain(std::iter::once(title.chars().count()))
        .max()
        .unwrap_or(0)
        + 2;

    let mut lines = Vec::with_capacity(body.len() + 4);
    lines.push(format!("┌{}┐", "─".repeat(inner)));
    lines.push(format!("│ {title:<width$} │", width = inner - 2));
    lines.push(format!("├{}┤", "─".repeat(inner)));
    if body.is_empty() {
        lines.push(format!("│ {:<width$} │", "(no features)", width = inner - 2));
    }
    for line in body {
        lines.push(format!("│ {line:<width$} │", width = inner - 2));
    }
    lines.push(format!("└{}┘", "─".repeat(inner)));
    lines
}

// ---------------------------------------------------------------------------
// Activity history
// ---------------------------------------------------------------------------

pub fn print_history(entries: &[ActivityEntry], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(&entries);
    }

    println!("{}", "Recent API Activity".bold().cyan());
    println!("{}", "=".repeat(80));
    println!(
        "  {:<25} {:<9} {:<6} {:<16} {:>6} {:>8}  Result",
        "Time", "Action", "Method", "Path", "Status", "Latency"
    );
    println!("  {}", "-".repeat(78));

    for entry in entries {
        let status = entry
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let result = if entry.ok {
            "ok".green()
        } else {
            entry
                .error_kind
                .as_deref()
                .unwrap_or("error")
                .red()
        };
        println!(
            "  {:<25} {:<9} {:<6} {:<16} {:>6} {:>6}ms  {}",
            truncate(&entry.timestamp, 25),
            entry.action,
            entry.method,
            truncate(&entry.path, 16),
            status,
            entry.latency_ms,
            result,
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
