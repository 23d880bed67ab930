//! `alertflow run` command handler

use std::io::Write;

use serde::Serialize;
use tracing::{info, warn};

use alertflow_core::config::AlertflowConfig;
use alertflow_log_pipeline::{LogPipelineBuilder, PipelineConfig, PipelineSummary};

use crate::cli::RunArgs;
use crate::commands::override_path;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command.
///
/// Streams the configured source through the pipeline until it is exhausted
/// and drained, or until Ctrl-C requests a shutdown.
pub async fn execute(
    args: RunArgs,
    config: AlertflowConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = apply_overrides(args, config);
    let pipeline_config = PipelineConfig::from_core(&config);

    info!(
        source = %pipeline_config.source_path,
        alerts = %pipeline_config.alerts_path,
        window_secs = pipeline_config.window_secs,
        threshold = pipeline_config.threshold,
        "starting pipeline"
    );

    let pipeline = LogPipelineBuilder::new().config(pipeline_config).build()?;
    let source = pipeline.config().source_path.clone();
    let alerts_path = pipeline.config().alerts_path.clone();

    let shutdown = pipeline.shutdown_token();
    let signal_task = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, shutting down");
                shutdown.cancel();
            }
            Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
        }
    });

    let result = pipeline.run().await;
    signal_task.abort();
    let summary = result?;

    writer.render(&RunReport {
        source,
        alerts_path,
        summary,
    })
}

/// Fold the command-line overrides into the loaded configuration.
fn apply_overrides(args: RunArgs, mut config: AlertflowConfig) -> AlertflowConfig {
    if let Some(file) = args.file {
        config.source.path = file;
    }
    if let Some(delay) = args.delay_ms {
        config.source.line_delay_ms = delay;
    }
    override_path(&mut config.alert_storage.alerts_file_path, args.alerts);
    config
}

/// Result of a pipeline run.
#[derive(Serialize)]
pub struct RunReport {
    pub source: String,
    pub alerts_path: String,
    pub summary: PipelineSummary,
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Pipeline finished: {}", self.source.bold())?;
        writeln!(w, "  Lines read:      {}", self.summary.lines_read)?;
        writeln!(w, "  Events parsed:   {}", self.summary.events_parsed)?;
        writeln!(w, "  Lines discarded: {}", self.summary.lines_discarded)?;
        writeln!(w, "  Critical events: {}", self.summary.critical_events)?;

        let alerts = self.summary.alerts_raised.to_string();
        let alerts = if self.summary.alerts_raised > 0 {
            alerts.red().bold()
        } else {
            alerts.green()
        };
        writeln!(w, "  Alerts raised:   {}", alerts)?;
        writeln!(w, "  Alerts file:     {}", self.alerts_path)?;
        Ok(())
    }
}
