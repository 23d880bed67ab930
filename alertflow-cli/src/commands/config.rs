//! `alertflow config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use alertflow_core::config::AlertflowConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::commands::{DEFAULT_CONFIG_FILE, resolve_config};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Sections accepted by `config show --section`.
const SECTIONS: &[&str] = &["general", "source", "event_analyzer", "alert_storage", "reports"];

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    explicit: Option<&Path>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(explicit, writer).await,
        ConfigAction::Show { section } => execute_show(explicit, section, writer).await,
    }
}

/// Load and validate the effective configuration, reporting any errors.
///
/// # Errors
///
/// Returns `CliError::Config` after rendering the report if validation fails.
async fn execute_validate(explicit: Option<&Path>, writer: &OutputWriter) -> Result<(), CliError> {
    let report = match resolve_config(explicit).await {
        Ok(loaded) => {
            info!(source = %loaded.source, "configuration is valid");
            ConfigValidationReport {
                source: loaded.source,
                valid: true,
                errors: Vec::new(),
            }
        }
        Err(e) => ConfigValidationReport {
            source: explicit
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_owned()),
            valid: false,
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }
    Ok(())
}

/// Display the effective configuration (file + env overrides + defaults).
///
/// # Errors
///
/// Returns `CliError::Config` if loading fails or `CliError::Command` if the
/// section name is unknown.
async fn execute_show(
    explicit: Option<&Path>,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let loaded = resolve_config(explicit).await?;
    let config_toml = render_section(&loaded.config, section.as_deref())?;

    writer.render(&ConfigReport {
        source: loaded.source,
        section,
        config_toml,
    })
}

/// Serialise the whole configuration or one section as TOML.
fn render_section(config: &AlertflowConfig, section: Option<&str>) -> Result<String, CliError> {
    let rendered = match section {
        None => toml::to_string_pretty(config),
        Some("general") => toml::to_string_pretty(&config.general),
        Some("source") => toml::to_string_pretty(&config.source),
        Some("event_analyzer") => toml::to_string_pretty(&config.event_analyzer),
        Some("alert_storage") => toml::to_string_pretty(&config.alert_storage),
        Some("reports") => toml::to_string_pretty(&config.reports),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {} (expected: {})",
                other,
                SECTIONS.join(", ")
            )));
        }
    };
    rendered.map_err(|e| CliError::Command(format!("failed to serialize configuration: {e}")))
}

/// Configuration display report.
///
/// `config_toml` is only used for text rendering and skipped in JSON output.
#[derive(Serialize)]
pub struct ConfigReport {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref section) = self.section {
            let section_label = format!("[{}]", section);
            writeln!(
                w,
                "Configuration {} (source: {})",
                section_label.bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;
        Ok(())
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    pub valid: bool,
    /// Empty when valid.
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }
        Ok(())
    }
}
