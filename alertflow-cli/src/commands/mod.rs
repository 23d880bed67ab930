//! Command handlers -- one module per subcommand

pub mod alerts;
pub mod clean;
pub mod config;
pub mod report;
pub mod run;

use std::path::{Path, PathBuf};

use alertflow_core::config::AlertflowConfig;

use crate::error::CliError;

/// Configuration file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "alertflow.toml";

/// Effective configuration together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AlertflowConfig,
    /// File path, or `"defaults"` when no file was read.
    pub source: String,
}

/// Resolve the effective configuration.
///
/// An explicit `--config` path must exist. Without one, `alertflow.toml` in the
/// working directory is used when present, otherwise defaults plus `ALERTFLOW_*`
/// environment overrides.
pub async fn resolve_config(explicit: Option<&Path>) -> Result<LoadedConfig, CliError> {
    let path: Option<PathBuf> = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            tokio::fs::try_exists(&default)
                .await
                .unwrap_or(false)
                .then_some(default)
        }
    };

    match path {
        Some(path) => {
            let config = AlertflowConfig::load(&path).await?;
            Ok(LoadedConfig {
                config,
                source: path.display().to_string(),
            })
        }
        None => {
            Ok(LoadedConfig {
                config: AlertflowConfig::from_env()?,
                source: "defaults".to_owned(),
            })
        }
    }
}

/// Apply an optional path override to a string config field.
pub(crate) fn override_path(target: &mut String, value: Option<PathBuf>) {
    if let Some(path) = value {
        *target = path.display().to_string();
    }
}
