//! CLI-specific error types and exit code mapping

use alertflow_core::error::{AlertflowError, PipelineError};
use alertflow_log_pipeline::LogPipelineError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The log source could not be opened.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// An alert could not be persisted.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                         |
    /// |------|---------------------------------|
    /// | 0    | Success                         |
    /// | 1    | General / command error         |
    /// | 2    | Configuration error             |
    /// | 3    | Log source unavailable          |
    /// | 4    | Alert persistence failed        |
    /// | 10   | IO error                        |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::SourceUnavailable(_) => 3,
            Self::Persistence(_) => 4,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<AlertflowError> for CliError {
    fn from(e: AlertflowError) -> Self {
        match e {
            AlertflowError::Config(inner) => Self::Config(inner.to_string()),
            AlertflowError::Pipeline(PipelineError::SourceUnavailable { path, reason }) => {
                Self::SourceUnavailable(format!("{path}: {reason}"))
            }
            AlertflowError::Storage(inner) => Self::Persistence(inner.to_string()),
            AlertflowError::Io(inner) => Self::Io(inner),
            other => Self::Command(other.to_string()),
        }
    }
}

impl From<LogPipelineError> for CliError {
    fn from(e: LogPipelineError) -> Self {
        match e {
            LogPipelineError::SourceUnavailable { path, reason } => {
                Self::SourceUnavailable(format!("{path}: {reason}"))
            }
            LogPipelineError::Config { field, reason } => Self::Config(format!("{field}: {reason}")),
            LogPipelineError::Storage { path, reason } => {
                Self::Persistence(format!("{path}: {reason}"))
            }
            LogPipelineError::Io(inner) => Self::Io(inner),
            other => Self::Command(other.to_string()),
        }
    }
}
