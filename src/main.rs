use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use churnctl::api::ApiClient;
use churnctl::cli;
use churnctl::config::{self, ChurnConfig, OutputFormat};
use churnctl::controller::Controller;
use churnctl::session::{FileStore, Session};

#[derive(Debug, Parser)]
#[command(name = "churnctl")]
#[command(about = "Score customers for churn risk against a prediction service")]
struct App {
    /// Output format: table (default) or json
    #[arg(long, global = true)]
    format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Log in and store the access token
    Login {
        #[arg(long, short)]
        username: Option<String>,
        /// Prompted for without echo when omitted
        #[arg(long, short)]
        password: Option<String>,
    },
    /// Forget the stored access token
    Logout,
    /// Show whether a session is active and which service is used
    Status,
    /// Predict churn for a single customer
    Predict {
        /// Record field as KEY=VALUE (repeatable)
        #[arg(long = "field", short = 'f', value_name = "KEY=VALUE")]
        fields: Vec<String>,
        /// JSON object with the record's fields; -f values override it
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Predict churn for every row of a CSV file
    Batch {
        /// CSV file to upload
        file: Option<PathBuf>,
    },
    /// Show the model's most important features
    Insights,
    /// Check that the prediction service is reachable
    Ping,
    /// Show recent API activity
    History {
        /// Number of entries to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write the default config to ~/.churnctl/config.toml
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Set a value, e.g. `churnctl config set api.base_url http://host:8000`
    Set { key: String, value: String },
    /// Reset ~/.churnctl/config.toml to defaults
    Reset,
}

fn main() -> ExitCode {
    let app = App::parse();

    match run(app) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "✗".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(app: App) -> Result<()> {
    let config = config::load();
    let format = match app.format.as_deref() {
        Some(raw) => OutputFormat::parse(raw)
            .with_context(|| format!("unknown output format '{raw}' (expected table or json)"))?,
        None => config.display.format,
    };

    match app.command {
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
        Commands::History { limit } => cli::run_history(&config, limit, format),
        Commands::Login { username, password } => {
            cli::run_login(&mut build_controller(&config)?, username, password)
        }
        Commands::Logout => cli::run_logout(&mut build_controller(&config)?),
        Commands::Status => cli::run_status(&build_controller(&config)?, &config),
        Commands::Predict { fields, input } => cli::run_predict(
            &build_controller(&config)?,
            &fields,
            input.as_deref(),
            format,
        ),
        Commands::Batch { file } => cli::run_batch(&build_controller(&config)?, file, format),
        Commands::Insights => cli::run_insights(&build_controller(&config)?, format),
        Commands::Ping => cli::run_ping(&build_controller(&config)?, format),
    }
}

fn build_controller(config: &ChurnConfig) -> Result<Controller> {
    let store = FileStore::new(config::expand_path(&config.session.path));
    let session = Session::init(store).context("failed to load session")?;
    Ok(Controller::new(session, ApiClient::from_config(config)))
}
