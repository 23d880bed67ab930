//! alertflow -- command-line entry point
//!
//! Parses arguments, resolves the effective configuration, initialises
//! logging, and dispatches to the subcommand handler. Errors are printed to
//! stderr and mapped to an exit code via [`CliError::exit_code`].

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;

use alertflow_core::config::GeneralConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let loaded = commands::resolve_config(cli.config.as_deref()).await;

    // `config validate` must still be able to report an invalid file,
    // so logging falls back to defaults when loading fails.
    let general = loaded
        .as_ref()
        .map(|l| l.config.general.clone())
        .unwrap_or_else(|_| GeneralConfig::default());
    logging::init_tracing(&general, cli.log_level.as_deref())
        .map_err(|e| CliError::Config(e.to_string()))?;
    alertflow_core::metrics::describe_all();

    match &loaded {
        Ok(l) => tracing::debug!(source = %l.source, "configuration resolved"),
        Err(e) => tracing::debug!(error = %e, "configuration could not be resolved"),
    }

    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Config(args) => {
            commands::config::execute(args, cli.config.as_deref(), &writer).await
        }
        Commands::Run(args) => commands::run::execute(args, loaded?.config, &writer).await,
        Commands::Alerts(args) => commands::alerts::execute(args, loaded?.config, &writer).await,
        Commands::Report(args) => commands::report::execute(args, loaded?.config, &writer).await,
        Commands::CleanReports(args) => {
            commands::clean::execute(args, loaded?.config, &writer).await
        }
    }
}
