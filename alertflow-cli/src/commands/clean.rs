//! `alertflow clean-reports` command handler

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use alertflow_core::config::AlertflowConfig;

use crate::cli::CleanArgs;
use crate::commands::override_path;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// File extensions produced by report generation.
const REPORT_EXTENSIONS: &[&str] = &["html", "pdf", "png"];

/// Execute the `clean-reports` command.
///
/// A missing report directory is reported in the output, not treated as an error.
pub async fn execute(
    args: CleanArgs,
    mut config: AlertflowConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    override_path(&mut config.reports.output_directory, args.output_dir);
    let dir = PathBuf::from(&config.reports.output_directory);

    let report = clean_directory(&dir).await?;
    info!(
        directory = %report.directory,
        removed = report.removed.len(),
        "report cleanup finished"
    );
    writer.render(&report)
}

/// Remove report files directly under `dir`. Subdirectories are left alone.
pub async fn clean_directory(dir: &Path) -> Result<CleanReport, CliError> {
    let mut report = CleanReport {
        directory: dir.display().to_string(),
        exists: true,
        removed: Vec::new(),
    };

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            report.exists = false;
            return Ok(report);
        }
        Err(e) => return Err(e.into()),
    };

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file() || !is_report_file(&path) {
            continue;
        }
        tokio::fs::remove_file(&path).await?;
        debug!(path = %path.display(), "removed report file");
        report.removed.push(path.display().to_string());
    }

    report.removed.sort();
    Ok(report)
}

fn is_report_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            REPORT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Result of a report cleanup.
#[derive(Debug, Serialize)]
pub struct CleanReport {
    pub directory: String,
    /// `false` when the directory did not exist.
    pub exists: bool,
    pub removed: Vec<String>,
}

impl Render for CleanReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if !self.exists {
            writeln!(
                w,
                "Report directory {} does not exist, nothing to clean",
                self.directory.bold()
            )?;
            return Ok(());
        }

        writeln!(
            w,
            "Removed {} report file(s) from {}",
            self.removed.len().to_string().green().bold(),
            self.directory
        )?;
        for path in &self.removed {
            writeln!(w, "  {}", path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clean_removes_only_report_files() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        for name in ["report_a.html", "report_a.pdf", "chart.PNG", "notes.txt", "alerts.json"] {
            std::fs::write(dir.path().join(name), "x").expect("write file");
        }
        std::fs::create_dir(dir.path().join("nested.html")).expect("create dir");

        let report = clean_directory(dir.path()).await.expect("clean should succeed");

        assert!(report.exists);
        assert_eq!(report.removed.len(), 3);
        assert!(dir.path().join("notes.txt").exists());
        assert!(dir.path().join("alerts.json").exists());
        assert!(dir.path().join("nested.html").is_dir());
        assert!(!dir.path().join("report_a.html").exists());
    }

    #[tokio::test]
    async fn test_clean_missing_directory_is_not_an_error() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let missing = dir.path().join("reports");

        let report = clean_directory(&missing).await.expect("missing dir is fine");
        assert!(!report.exists);
        assert!(report.removed.is_empty());

        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render should succeed");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("does not exist"));
    }

    #[tokio::test]
    async fn test_clean_empty_directory() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let report = clean_directory(dir.path()).await.expect("clean should succeed");
        assert!(report.exists);
        assert!(report.removed.is_empty());
    }

    #[test]
    fn test_render_lists_removed_files() {
        let report = CleanReport {
            directory: "reports".to_owned(),
            exists: true,
            removed: vec!["reports/report_1.html".to_owned()],
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render should succeed");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("report file(s)"));
        assert!(output.contains("reports/report_1.html"));
    }

    #[test]
    fn test_is_report_file() {
        assert!(is_report_file(Path::new("a.html")));
        assert!(is_report_file(Path::new("dir/b.Pdf")));
        assert!(!is_report_file(Path::new("c.json")));
        assert!(!is_report_file(Path::new("html")));
    }
}
