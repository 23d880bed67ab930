//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// alertflow -- detect bursts of critical events in JSON-lines logs.
///
/// Use `alertflow <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "alertflow", version, about, long_about = None)]
pub struct Cli {
    /// Path to the alertflow.toml configuration file.
    ///
    /// When omitted, `alertflow.toml` in the working directory is used if present,
    /// otherwise built-in defaults plus `ALERTFLOW_*` environment overrides.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream a log through the burst detector and persist alerts.
    Run(RunArgs),

    /// List persisted alerts and their events.
    #[command(visible_alias = "show-alerts")]
    Alerts(AlertsArgs),

    /// Generate an HTML report of event levels and alerts.
    Report(ReportArgs),

    /// Delete generated report files.
    CleanReports(CleanArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- run ----

/// Run the pipeline until the source is exhausted or Ctrl-C is pressed.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Log file to read (`-` for stdin). Overrides `source.path`.
    #[arg(short, long)]
    pub file: Option<String>,

    /// Delay between lines in milliseconds. Overrides `source.line_delay_ms`.
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Alerts file. Overrides `alert_storage.alerts_file_path`.
    #[arg(long)]
    pub alerts: Option<PathBuf>,
}

// ---- alerts ----

/// Show the alerts recorded so far.
#[derive(Args, Debug)]
pub struct AlertsArgs {
    /// Alerts file. Overrides `alert_storage.alerts_file_path`.
    #[arg(long)]
    pub alerts: Option<PathBuf>,
}

// ---- report ----

/// Build an HTML report from a completed log and the alerts file.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Event log to summarise. Overrides `source.path`.
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Alerts file. Overrides `alert_storage.alerts_file_path`.
    #[arg(long)]
    pub alerts: Option<PathBuf>,

    /// Output directory. Overrides `reports.output_directory`.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

// ---- clean-reports ----

/// Remove generated reports.
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Report directory. Overrides `reports.output_directory`.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

// ---- config ----

/// Manage alertflow configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, source, event_analyzer, alert_storage, reports).
        #[arg(long)]
        section: Option<String>,
    },
}
