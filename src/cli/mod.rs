//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `churnctl login` / `logout` / `status` — session management
//! - `churnctl predict` — score one customer record
//! - `churnctl batch FILE` — score a CSV upload
//! - `churnctl insights` — global feature importances
//! - `churnctl ping` — service reachability
//! - `churnctl history` — recent API activity
//! - `churnctl config show|init|set|reset` — configuration management

use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use colored::Colorize;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal as tty;

use crate::activity::ActivityLog;
use crate::config::{self, ChurnConfig, OutputFormat};
use crate::controller::{Action, ClientError, Controller, LoginOutcome};
use crate::form::Form;
use crate::render::terminal;
use crate::session::View;

/// Turn a failed action into the error shown to the user.
fn alert(action: Action, err: ClientError) -> anyhow::Error {
    let title = match action {
        Action::Login => "Login failed",
        Action::Predict => "Prediction failed",
        Action::Batch => "Batch prediction failed",
        Action::Insights => "Loading insights failed",
        Action::Ping => "Ping failed",
    };
    anyhow!("{title}: {err}\n  {}", err.hint(action))
}

// ---------------------------------------------------------------------------
// churnctl login / logout / status
// ---------------------------------------------------------------------------

/// Log in, prompting on stdin for anything not given on the command line.
pub fn run_login(
    controller: &mut Controller,
    username: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let username = match username {
        Some(u) => u,
        None => prompt("Username: ")?,
    };
    let password = match password {
        Some(p) => p,
        None => prompt_hidden("Password: ")?,
    };

    let mut form = Form::new();
    form.set("username", username);
    form.set("password", password);

    match controller
        .login(&form)
        .map_err(|e| alert(Action::Login, e))?
    {
        LoginOutcome::Accepted => {
            println!("{} Logged in.", "✓".green().bold());
            Ok(())
        }
        LoginOutcome::Rejected => Err(anyhow!("Invalid username or password.")),
    }
}

fn prompt(label: &str) -> Result<String> {
    eprint!("{label}");
    std::io::stderr().flush().ok();

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Read a secret without echoing it. Piped stdin is read as a plain line.
fn prompt_hidden(label: &str) -> Result<String> {
    if !std::io::stdin().is_terminal() {
        return prompt(label);
    }

    eprint!("{label}");
    std::io::stderr().flush().ok();

    tty::enable_raw_mode().context("failed to switch the terminal to raw mode")?;
    let result = read_hidden_line();
    let _ = tty::disable_raw_mode();
    eprintln!();
    result
}

fn read_hidden_line() -> Result<String> {
    let mut line = String::new();
    loop {
        let Event::Key(key) = event::read().context("failed to read from the terminal")? else {
            continue;
        };
        match hidden_input_step(&mut line, key) {
            HiddenInput::Pending => {}
            HiddenInput::Done => return Ok(line),
            HiddenInput::Cancelled => bail!("Login cancelled."),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum HiddenInput {
    Pending,
    Done,
    Cancelled,
}

/// Apply one key press to a secret being typed.
fn hidden_input_step(line: &mut String, key: KeyEvent) -> HiddenInput {
    if key.kind == KeyEventKind::Release {
        return HiddenInput::Pending;
    }
    match key.code {
        KeyCode::Enter => HiddenInput::Done,
        KeyCode::Esc => HiddenInput::Cancelled,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            HiddenInput::Cancelled
        }
        KeyCode::Backspace => {
            line.pop();
            HiddenInput::Pending
        }
        KeyCode::Char(c) => {
            line.push(c);
            HiddenInput::Pending
        }
        _ => HiddenInput::Pending,
    }
}

pub fn run_logout(controller: &mut Controller) -> Result<()> {
    let was_authenticated = controller.session().is_authenticated();
    controller
        .logout()
        .map_err(|e| anyhow!("Logout failed: {e}"))?;
    if was_authenticated {
        println!("{} Logged out.", "✓".green().bold());
    } else {
        println!("{}", "Not logged in.".yellow());
    }
    Ok(())
}

pub fn run_status(controller: &Controller, config: &ChurnConfig) -> Result<()> {
    let view = controller.view();
    let (mark, state) = match view {
        View::Application => ("✓".green().bold(), "logged in".green()),
        View::Login => ("·".dimmed(), "logged out".yellow()),
    };
    println!("  {mark} {:<10} {state} ({view} view)", "Session");
    println!("    {:<10} {}", "API", controller.api().base_url());
    println!(
        "    {:<10} {}",
        "Store",
        config::expand_path(&config.session.path).display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// churnctl predict / batch / insights / ping
// ---------------------------------------------------------------------------

/// Score one record built from `--input` (if any) then `-f KEY=VALUE` pairs.
pub fn run_predict(
    controller: &Controller,
    fields: &[String],
    input: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let mut form = match input {
        Some(path) => Form::from_json_file(path).map_err(|e| alert(Action::Predict, e.into()))?,
        None => Form::new(),
    };
    form.extend_pairs(fields)
        .map_err(|e| alert(Action::Predict, e.into()))?;

    let view = controller
        .predict(&form)
        .map_err(|e| alert(Action::Predict, e))?;
    terminal::print_prediction(&view, format)
}

pub fn run_batch(controller: &Controller, file: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let view = controller
        .predict_batch(file.as_deref())
        .map_err(|e| alert(Action::Batch, e))?;
    terminal::print_batch(&view, format)
}

pub fn run_insights(controller: &Controller, format: OutputFormat) -> Result<()> {
    let view = controller
        .insights()
        .map_err(|e| alert(Action::Insights, e))?;
    terminal::print_insights(&view, format)
}

pub fn run_ping(controller: &Controller, format: OutputFormat) -> Result<()> {
    let pong = controller.ping().map_err(|e| alert(Action::Ping, e))?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&pong)?);
        return Ok(());
    }
    println!(
        "{} {} is {} (version {})",
        "✓".green().bold(),
        controller.api().base_url(),
        pong.status,
        pong.version.as_deref().unwrap_or("unknown"),
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// churnctl history
// ---------------------------------------------------------------------------

pub fn run_history(config: &ChurnConfig, limit: usize, format: OutputFormat) -> Result<()> {
    let log = ActivityLog::at(config::expand_path(&config.logging.path));
    let entries = log.recent(limit);

    if entries.is_empty() {
        println!(
            "{}",
            "No activity yet. API calls are logged as you use churnctl.".yellow()
        );
        return Ok(());
    }

    terminal::print_history(&entries, format)
}

// ---------------------------------------------------------------------------
// churnctl config show | init | set | reset
// ---------------------------------------------------------------------------

pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective churnctl Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global = config::global_config_file();
    let global_exists = global.as_ref().map(|p| p.exists()).unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    let mark = if global_exists { "✓".green() } else { "·".dimmed() };
    println!("  {mark} {}", "~/.churnctl/config.toml".dimmed());
    let mark = if Path::new(".churnctl.toml").exists() {
        "✓".green()
    } else {
        "·".dimmed()
    };
    println!("  {mark} {}", ".churnctl.toml".dimmed());
    println!("  {} {}", "·".dimmed(), "CHURNCTL_* environment variables".dimmed());
    Ok(())
}

pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}
