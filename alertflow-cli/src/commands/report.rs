//! `alertflow report` command handler
//!
//! Builds a self-contained HTML report from a completed log and the alerts file:
//! totals, per-level counts with a bar visualisation, the alert list, and a
//! level filter.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use tracing::info;

use alertflow_core::config::AlertflowConfig;
use alertflow_core::event::Event;
use alertflow_core::types::Alert;
use alertflow_log_pipeline::collector::file::STDIN_PATH;
use alertflow_log_pipeline::{JsonEventParser, load_alerts_with, load_events_with};

use crate::cli::ReportArgs;
use crate::commands::override_path;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `report` command.
pub async fn execute(
    args: ReportArgs,
    mut config: AlertflowConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    override_path(&mut config.source.path, args.events);
    override_path(&mut config.alert_storage.alerts_file_path, args.alerts);
    override_path(&mut config.reports.output_directory, args.output_dir);

    if config.source.path == STDIN_PATH {
        return Err(CliError::Command(
            "report needs a completed log file, not stdin".to_owned(),
        ));
    }

    let parser = JsonEventParser::new(config.source.fields.clone())
        .with_max_input_size(config.source.max_line_length);
    let events = load_events_with(&config.source.path, &parser).await;
    let alerts =
        load_alerts_with(&config.alert_storage.alerts_file_path, &config.source.fields).await;

    let stats = LevelStats::from_events(&events, &config.event_analyzer.critical_levels);
    let generated_at = Local::now();
    let html = render_html(&stats, &alerts, &generated_at.to_rfc3339());

    let dir = PathBuf::from(&config.reports.output_directory);
    tokio::fs::create_dir_all(&dir).await?;
    let path = dir.join(report_file_name(&config.reports.html_report_file, &generated_at));
    tokio::fs::write(&path, html).await?;

    info!(
        path = %path.display(),
        events = stats.total_events,
        alerts = alerts.len(),
        "report written"
    );

    writer.render(&ReportSummary {
        path: path.display().to_string(),
        events_source: config.source.path,
        alerts_source: config.alert_storage.alerts_file_path,
        alerts: alerts.len(),
        stats,
    })
}

/// Event counts by level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelStats {
    pub total_events: usize,
    pub critical_events: usize,
    /// Count per (uppercased) level, sorted by level name.
    pub per_level: BTreeMap<String, usize>,
    /// Mean count per distinct level, rounded to two decimals.
    pub mean_per_level: f64,
}

impl LevelStats {
    pub fn from_events(events: &[Event], critical_levels: &[String]) -> Self {
        let critical: BTreeSet<String> = critical_levels
            .iter()
            .map(|level| level.trim().to_uppercase())
            .filter(|level| !level.is_empty())
            .collect();

        let mut per_level = BTreeMap::new();
        let mut critical_events = 0;
        for event in events {
            *per_level.entry(event.level().to_owned()).or_insert(0usize) += 1;
            if critical.contains(event.level()) {
                critical_events += 1;
            }
        }

        let mean_per_level = if per_level.is_empty() {
            0.0
        } else {
            let mean = events.len() as f64 / per_level.len() as f64;
            (mean * 100.0).round() / 100.0
        };

        Self {
            total_events: events.len(),
            critical_events,
            per_level,
            mean_per_level,
        }
    }

    fn max_count(&self) -> usize {
        self.per_level.values().copied().max().unwrap_or(0)
    }
}

/// `report.html` + timestamp -> `report_2024-01-15_12-00-00.html`.
pub fn report_file_name<Tz: TimeZone>(configured: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let stem = Path::new(configured)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("report");
    format!("{}_{}.html", stem, at.format("%Y-%m-%d_%H-%M-%S"))
}

/// Render the full HTML document.
pub fn render_html(stats: &LevelStats, alerts: &[Alert], generated_at: &str) -> String {
    let mut html = String::with_capacity(4096);

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>alertflow report</title>\n");
    html.push_str(STYLE);
    html.push_str("</head>\n<body>\n<h1>Monitoring report</h1>\n");
    let _ = writeln!(
        html,
        "<p class=\"generated\">Generated at {}</p>",
        escape_html(generated_at)
    );
    let _ = writeln!(html, "<p><b>Total events:</b> {}</p>", stats.total_events);
    let _ = writeln!(html, "<p><b>Critical:</b> {}</p>", stats.critical_events);
    let _ = writeln!(html, "<p><b>Alerts:</b> {}</p>", alerts.len());

    html.push_str("<h2>Filter</h2>\n<label for=\"filter\">Show level:</label>\n");
    html.push_str("<select id=\"filter\" onchange=\"filterReport()\">\n");
    html.push_str("<option value=\"ALL\">All</option>\n");
    for level in stats.per_level.keys() {
        let level = escape_html(level);
        let _ = writeln!(html, "<option value=\"{level}\">{level}</option>");
    }
    html.push_str("</select>\n");

    let _ = writeln!(
        html,
        "<h2>Events per level (mean: {:.2})</h2>",
        stats.mean_per_level
    );
    html.push_str("<table class=\"stats-table\">\n<thead><tr><th>Level</th><th>Count</th><th></th></tr></thead>\n<tbody>\n");
    let max = stats.max_count().max(1);
    for (level, count) in &stats.per_level {
        let width = count * 100 / max;
        let level = escape_html(level);
        let _ = writeln!(
            html,
            "<tr data-level=\"{level}\"><td>{level}</td><td>{count}</td>\
             <td class=\"bar-cell\"><div class=\"bar\" style=\"width: {width}%\"></div></td></tr>"
        );
    }
    html.push_str("</tbody>\n</table>\n");

    html.push_str("<h2>Detected alerts</h2>\n<ul id=\"alertList\">\n");
    if alerts.is_empty() {
        html.push_str("<li class=\"empty\">No alerts</li>\n");
    }
    for alert in alerts {
        let levels: BTreeSet<&str> = alert.events().iter().map(|e| e.level()).collect();
        let levels = levels.into_iter().collect::<Vec<_>>().join(" ");
        let _ = writeln!(
            html,
            "<li data-levels=\"{}\">{} ({} events)</li>",
            escape_html(&levels),
            escape_html(&alert.triggered_at().to_rfc3339()),
            alert.len()
        );
    }
    html.push_str("</ul>\n");

    html.push_str(SCRIPT);
    html.push_str("</body>\n</html>\n");
    html
}

/// Escape text for HTML element content and double-quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = r#"<style>
body { font-family: Arial, sans-serif; background: #f8f9fa; color: #333; margin: 20px; }
h1 { color: #c0392b; }
.generated { color: #777; font-size: 0.9em; }
.stats-table { border-collapse: collapse; width: 60%; margin-top: 20px; }
.stats-table th, .stats-table td { border: 1px solid #ccc; padding: 8px; text-align: left; }
.stats-table th { background-color: #f1f1f1; }
.bar-cell { width: 50%; }
.bar { background: #3498db; height: 14px; border: 1px solid #1f6391; }
ul { background: #fff3cd; padding: 10px; border-radius: 5px; list-style-type: none; }
ul li { margin: 5px 0; padding: 5px; }
select { padding: 5px; margin: 10px 0; border-radius: 4px; border: 1px solid #ccc; }
</style>
"#;

const SCRIPT: &str = r##"<script>
function filterReport() {
    var filter = document.getElementById("filter").value;
    document.querySelectorAll(".stats-table tbody tr").forEach(function (row) {
        var show = filter === "ALL" || row.getAttribute("data-level") === filter;
        row.style.display = show ? "" : "none";
    });
    document.querySelectorAll("#alertList li[data-levels]").forEach(function (item) {
        var levels = item.getAttribute("data-levels").split(" ");
        var show = filter === "ALL" || levels.indexOf(filter) !== -1;
        item.style.display = show ? "" : "none";
    });
}
</script>
"##;

/// Result of the `report` command.
#[derive(Serialize)]
pub struct ReportSummary {
    pub path: String,
    pub events_source: String,
    pub alerts_source: String,
    pub alerts: usize,
    #[serde(flatten)]
    pub stats: LevelStats,
}

impl Render for ReportSummary {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Report written: {}", self.path.bold())?;
        writeln!(
            w,
            "  Events:   {} ({} critical) from {}",
            self.stats.total_events, self.stats.critical_events, self.events_source
        )?;
        writeln!(w, "  Alerts:   {} from {}", self.alerts, self.alerts_source)?;
        for (level, count) in &self.stats.per_level {
            writeln!(w, "  {:<10}{}", level, count)?;
        }
        writeln!(w, "  Mean per level: {:.2}", self.stats.mean_per_level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use alertflow_core::event::EventFieldMapping;

    use crate::cli::OutputFormat;

    fn event(secs: u32, level: &str) -> Event {
        let value = serde_json::json!({
            "timestamp": format!("2024-01-15T12:00:{secs:02}Z"),
            "level": level,
            "message": format!("{level} at {secs}"),
        });
        Event::from_value(value, &EventFieldMapping::default()).expect("valid event")
    }

    fn critical_levels() -> Vec<String> {
        vec!["CRITICAL".to_owned()]
    }

    #[test]
    fn test_level_stats_counts_and_mean() {
        let events = vec![
            event(0, "info"),
            event(1, "INFO"),
            event(2, "warning"),
            event(3, "critical"),
            event(4, "CRITICAL"),
        ];
        let stats = LevelStats::from_events(&events, &critical_levels());

        assert_eq!(stats.total_events, 5);
        assert_eq!(stats.critical_events, 2);
        assert_eq!(stats.per_level.get("INFO"), Some(&2));
        assert_eq!(stats.per_level.get("WARNING"), Some(&1));
        assert_eq!(stats.per_level.get("CRITICAL"), Some(&2));
        assert!((stats.mean_per_level - 1.67).abs() < f64::EPSILON);
    }

    #[test]
    fn test_level_stats_custom_critical_levels() {
        let events = vec![event(0, "error"), event(1, "critical"), event(2, "info")];
        let stats = LevelStats::from_events(&events, &["error".to_owned(), " critical ".to_owned()]);
        assert_eq!(stats.critical_events, 2);
    }

    #[test]
    fn test_level_stats_empty() {
        let stats = LevelStats::from_events(&[], &critical_levels());
        assert_eq!(stats.total_events, 0);
        assert!(stats.per_level.is_empty());
        assert_eq!(stats.mean_per_level, 0.0);
    }

    #[test]
    fn test_report_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 9, 5, 3).single().expect("valid date");
        assert_eq!(report_file_name("report.html", &at), "report_2024-01-15_09-05-03.html");
        assert_eq!(report_file_name("daily.html", &at), "daily_2024-01-15_09-05-03.html");
        assert_eq!(report_file_name("", &at), "report_2024-01-15_09-05-03.html");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>"a" & 'b'</script>"#),
            "&lt;script&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/script&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_render_html_contents() {
        let events = vec![event(0, "critical"), event(2, "critical"), event(4, "critical")];
        let alert = Alert::new(events[2].timestamp(), events.clone());
        let mut all = events;
        all.push(event(5, "info"));
        let stats = LevelStats::from_events(&all, &critical_levels());

        let html = render_html(&stats, &[alert], "2024-01-15T13:00:00+00:00");

        assert!(html.contains("<b>Total events:</b> 4"));
        assert!(html.contains("<b>Critical:</b> 3"));
        assert!(html.contains("<b>Alerts:</b> 1"));
        assert!(html.contains("<option value=\"CRITICAL\">CRITICAL</option>"));
        assert!(html.contains("<td>INFO</td><td>1</td>"));
        assert!(html.contains("width: 100%"));
        assert!(html.contains("width: 33%"));
        assert!(html.contains("2024-01-15T12:00:04+00:00 (3 events)"));
        assert!(html.contains("data-levels=\"CRITICAL\""));
        assert!(html.contains("function filterReport()"));
    }

    #[test]
    fn test_render_html_escapes_levels() {
        let events = vec![event(0, "<b>x</b>")];
        let stats = LevelStats::from_events(&events, &critical_levels());
        let html = render_html(&stats, &[], "now");

        assert!(!html.contains("<B>X</B>"));
        assert!(html.contains("&lt;B&gt;X&lt;/B&gt;"));
        assert!(html.contains("No alerts"));
    }

    #[test]
    fn test_report_summary_json_is_flat() {
        let stats = LevelStats::from_events(&[event(0, "info")], &critical_levels());
        let summary = ReportSummary {
            path: "reports/report_x.html".to_owned(),
            events_source: "events.log".to_owned(),
            alerts_source: "alerts.json".to_owned(),
            alerts: 0,
            stats,
        };

        let writer = OutputWriter::new(OutputFormat::Json);
        let mut buffer = Vec::new();
        writer.write_to(&mut buffer, &summary).expect("json should render");
        let parsed: serde_json::Value = serde_json::from_slice(&buffer).expect("valid JSON");

        assert_eq!(parsed["total_events"], 1);
        assert_eq!(parsed["per_level"]["INFO"], 1);
        assert_eq!(parsed["path"], "reports/report_x.html");
    }

    #[tokio::test]
    async fn test_execute_writes_report() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let events_path = dir.path().join("events.log");
        std::fs::write(
            &events_path,
            concat!(
                r#"{"timestamp":"2024-01-15T12:00:00Z","level":"info","message":"boot"}"#,
                "\n",
                "garbage\n",
                r#"{"timestamp":"2024-01-15T12:00:01Z","level":"critical","message":"fail"}"#,
                "\n",
            ),
        )
        .expect("write events");
        let out_dir = dir.path().join("reports");

        let args = ReportArgs {
            events: Some(events_path),
            alerts: Some(dir.path().join("alerts.json")),
            output_dir: Some(out_dir.clone()),
        };
        let writer = OutputWriter::new(OutputFormat::Json);
        execute(args, AlertflowConfig::default(), &writer)
            .await
            .expect("report should succeed");

        let written: Vec<_> = std::fs::read_dir(&out_dir)
            .expect("output dir exists")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(written.len(), 1);
        assert!(written[0].starts_with("report_"));
        assert!(written[0].ends_with(".html"));

        let html = std::fs::read_to_string(out_dir.join(&written[0])).expect("read report");
        assert!(html.contains("<b>Total events:</b> 2"));
        assert!(html.contains("<b>Alerts:</b> 0"));
    }

    #[tokio::test]
    async fn test_execute_rejects_stdin_source() {
        let args = ReportArgs {
            events: Some(PathBuf::from("-")),
            alerts: None,
            output_dir: None,
        };
        let writer = OutputWriter::new(OutputFormat::Json);
        let err = execute(args, AlertflowConfig::default(), &writer)
            .await
            .expect_err("stdin is not a report source");
        assert!(matches!(err, CliError::Command(_)));
    }
}
