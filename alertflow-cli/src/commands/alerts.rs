//! `alertflow alerts` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use alertflow_core::config::AlertflowConfig;
use alertflow_core::types::Alert;
use alertflow_log_pipeline::load_alerts_with;

use crate::cli::AlertsArgs;
use crate::commands::override_path;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `alerts` command.
///
/// A missing or unreadable alerts file is reported as an empty list.
pub async fn execute(
    args: AlertsArgs,
    mut config: AlertflowConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    override_path(&mut config.alert_storage.alerts_file_path, args.alerts);
    let path = config.alert_storage.alerts_file_path;

    info!(path = %path, "loading alerts");
    let alerts = load_alerts_with(&path, &config.source.fields).await;

    writer.render(&AlertsReport {
        source: path,
        total: alerts.len(),
        alerts,
    })
}

/// Persisted alerts listing.
#[derive(Serialize)]
pub struct AlertsReport {
    pub source: String,
    pub total: usize,
    pub alerts: Vec<Alert>,
}

impl Render for AlertsReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if self.alerts.is_empty() {
            writeln!(w, "No alerts recorded in {}", self.source)?;
            return Ok(());
        }

        writeln!(w, "Alerts ({}): {}", self.total, self.source.bold())?;
        for alert in &self.alerts {
            writeln!(w)?;
            writeln!(
                w,
                "{} {} ({} events)",
                "Alert at".red().bold(),
                alert.triggered_at().to_rfc3339(),
                alert.len()
            )?;
            for event in alert.events() {
                writeln!(
                    w,
                    "  {} | {} | {}",
                    event.timestamp().to_rfc3339(),
                    event.level(),
                    event.message()
                )?;
            }
        }
        Ok(())
    }
}
