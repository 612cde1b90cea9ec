//! Report rendering
//!
//! Compiles a final [`CrawlState`] into a JSON document and a standalone
//! HTML page. The state is consumed read-only; `errors`, `visited_urls`,
//! and `crawl_map` are reported exactly as the loop left them.

use crate::error::Result;
use crate::state::{Action, CrawlState, ErrorKind, ErrorRecord};
use chrono::{DateTime, Utc};
use htmlescape::encode_minimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::info;

/// Counts surfaced at the top of a report
#[derive(Debug, Serialize)]
pub struct ReportSummary {
    /// Distinct URLs visited
    pub total_visited_urls: usize,
    /// Anomalies recorded across the run
    pub total_errors: usize,
    /// Actions performed across all URLs
    pub total_actions: usize,
}

/// The JSON report document
#[derive(Debug, Serialize)]
pub struct CrawlReport<'a> {
    /// Generation time
    pub timestamp: DateTime<Utc>,
    /// Headline counts
    pub summary: ReportSummary,
    /// Every URL the run reached
    pub visited_paths: &'a BTreeSet<String>,
    /// Every anomaly, in arrival order
    pub errors: &'a [ErrorRecord],
    /// Per-URL action history
    pub crawl_map: &'a BTreeMap<String, Vec<Action>>,
}

/// Paths of the rendered report files
#[derive(Debug, Clone)]
pub struct ReportPaths {
    /// JSON document
    pub json: PathBuf,
    /// HTML page
    pub html: PathBuf,
}

/// Renders crawl reports into an output directory
pub struct Reporter {
    output_dir: PathBuf,
}

impl Reporter {
    /// Create a reporter, creating the output directory if needed
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    /// Render JSON and HTML reports for a finished (or recovered) run
    pub fn generate(&self, state: &CrawlState) -> Result<ReportPaths> {
        let report = CrawlReport {
            timestamp: Utc::now(),
            summary: ReportSummary {
                total_visited_urls: state.visited_urls.len(),
                total_errors: state.errors.len(),
                total_actions: state.total_actions(),
            },
            visited_paths: &state.visited_urls,
            errors: &state.errors,
            crawl_map: &state.crawl_map,
        };

        let stamp = report.timestamp.timestamp_millis();
        let json_path = self.output_dir.join(format!("crawl-report-{stamp}.json"));
        let html_path = self.output_dir.join(format!("crawl-report-{stamp}.html"));

        std::fs::write(&json_path, serde_json::to_string_pretty(&report)?)?;
        std::fs::write(&html_path, render_html(&report))?;

        info!(
            json = %json_path.display(),
            html = %html_path.display(),
            visited = report.summary.total_visited_urls,
            errors = report.summary.total_errors,
            "reports generated"
        );

        Ok(ReportPaths {
            json: json_path,
            html: html_path,
        })
    }

    /// The directory reports are written into
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

fn error_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::PageError => "pageerror",
        ErrorKind::ConsoleError => "console_error",
        ErrorKind::NetworkError => "network_error",
        ErrorKind::ActionError => "action_error",
    }
}

fn render_error(err: &ErrorRecord) -> String {
    let detail = match (&err.message, err.status) {
        (Some(msg), _) => encode_minimal(msg),
        (None, Some(status)) => format!("HTTP {status}"),
        (None, None) => "Unknown error".to_string(),
    };
    format!(
        r#"<div class="card error-card"><span class="badge">{kind}</span><p class="mono">{detail}</p><p><a href="{url}">{url}</a></p></div>"#,
        kind = error_label(err.kind),
        detail = detail,
        url = encode_minimal(&err.url),
    )
}

fn render_action(action: &Action) -> String {
    let (label, target) = match action {
        Action::Navigate { url, element } => {
            ("navigate", format!("{} → {}", element.selector, url))
        }
        Action::Interact { element, .. } => ("interact", element.selector.clone()),
    };
    format!(
        r#"<li><span class="badge">{label}</span> <span class="mono">{}</span></li>"#,
        encode_minimal(&target)
    )
}

fn render_html(report: &CrawlReport<'_>) -> String {
    let errors = if report.errors.is_empty() {
        "<p class=\"muted\">No errors encountered during the crawl.</p>".to_string()
    } else {
        report.errors.iter().map(render_error).collect()
    };

    let visited: String = report
        .visited_paths
        .iter()
        .map(|url| {
            let url = encode_minimal(url);
            format!(r#"<li><a href="{url}">{url}</a></li>"#)
        })
        .collect();

    let crawl_map: String = report
        .crawl_map
        .iter()
        .map(|(url, actions)| {
            let items: String = actions.iter().map(render_action).collect();
            format!(
                r#"<div class="card"><h4>{}</h4><ul>{}</ul></div>"#,
                encode_minimal(url),
                if items.is_empty() {
                    "<li class=\"muted\">No actions taken</li>".to_string()
                } else {
                    items
                }
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Exploratory Crawl Report</title>
<style>
body {{ font-family: -apple-system, 'Segoe UI', sans-serif; background: #0f172a; color: #f8fafc; margin: 0; }}
.container {{ max-width: 1100px; margin: 0 auto; padding: 2rem; }}
h1 {{ color: #60a5fa; }}
.stats {{ display: flex; gap: 1.5rem; margin-bottom: 2rem; }}
.stat {{ flex: 1; text-align: center; }}
.stat .value {{ font-size: 2.5rem; font-weight: 700; color: #3b82f6; }}
.stat .value.danger {{ color: #ef4444; }}
.card {{ background: #1e293b; border-radius: 12px; padding: 1rem 1.5rem; margin-bottom: 1rem; }}
.error-card {{ border-left: 4px solid #ef4444; }}
.badge {{ display: inline-block; padding: 0.2rem 0.6rem; border-radius: 9999px; font-size: 0.7rem; font-weight: 600; text-transform: uppercase; background: rgba(59, 130, 246, 0.2); color: #93c5fd; }}
.mono {{ font-family: monospace; word-break: break-all; }}
.muted {{ color: #94a3b8; }}
a {{ color: #3b82f6; text-decoration: none; }}
ul {{ list-style: none; padding: 0; }}
li {{ padding: 0.4rem 0; border-bottom: 1px solid rgba(255,255,255,0.05); }}
</style>
</head>
<body>
<div class="container">
<header><h1>Exploratory Crawl Report</h1><p class="muted">Generated on {timestamp}</p></header>
<div class="stats">
<div class="stat card"><div class="value">{visited_count}</div><div>Unique URLs Visited</div></div>
<div class="stat card"><div class="value{error_class}">{error_count}</div><div>Errors Detected</div></div>
<div class="stat card"><div class="value">{action_count}</div><div>Actions Performed</div></div>
</div>
<h2>Errors Encountered</h2>
{errors}
<h2>Visited Paths</h2>
<div class="card"><ul>{visited}</ul></div>
<h2>Crawl Action Map</h2>
{crawl_map}
</div>
</body>
</html>
"#,
        timestamp = report.timestamp.to_rfc3339(),
        visited_count = report.summary.total_visited_urls,
        error_class = if report.summary.total_errors > 0 {
            " danger"
        } else {
            ""
        },
        error_count = report.summary.total_errors,
        action_count = report.summary.total_actions,
        errors = errors,
        visited = visited,
        crawl_map = crawl_map,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Element, ElementKind, StateUpdate};

    fn temp_report_dir() -> PathBuf {
        std::env::temp_dir().join(format!("curiocrawl-report-{}", uuid::Uuid::new_v4()))
    }

    fn sample_state() -> CrawlState {
        let mut state = CrawlState::new("https://example.test/");
        state.apply(StateUpdate {
            visited_urls: BTreeSet::from(["https://example.test/about".to_string()]),
            crawl_map: BTreeMap::from([(
                "https://example.test/".to_string(),
                vec![Action::Interact {
                    element: Element {
                        id: "el_0".to_string(),
                        kind: ElementKind::Button,
                        input_type: None,
                        text: "<b>Save</b>".to_string(),
                        href: None,
                        selector: "#save".to_string(),
                        visible: true,
                    },
                    value: None,
                }],
            )]),
            errors: vec![ErrorRecord::console_error(
                "<script>alert(1)</script>",
                "https://example.test/",
            )],
            ..Default::default()
        });
        state
    }

    #[test]
    fn test_generate_writes_both_files() {
        let dir = temp_report_dir();
        let reporter = Reporter::new(&dir).unwrap();
        let paths = reporter.generate(&sample_state()).unwrap();

        assert!(paths.json.exists());
        assert!(paths.html.exists());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_json_report_shape() {
        let dir = temp_report_dir();
        let reporter = Reporter::new(&dir).unwrap();
        let paths = reporter.generate(&sample_state()).unwrap();

        let raw = std::fs::read_to_string(&paths.json).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(doc["summary"]["total_visited_urls"], 2);
        assert_eq!(doc["summary"]["total_errors"], 1);
        assert_eq!(doc["summary"]["total_actions"], 1);
        assert_eq!(doc["errors"][0]["type"], "console_error");
        assert!(doc["visited_paths"]
            .as_array()
            .unwrap()
            .contains(&serde_json::json!("https://example.test/about")));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_html_report_escapes_dynamic_text() {
        let dir = temp_report_dir();
        let reporter = Reporter::new(&dir).unwrap();
        let paths = reporter.generate(&sample_state()).unwrap();

        let html = std::fs::read_to_string(&paths.html).unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Unique URLs Visited"));

        let _ = std::fs::remove_dir_all(dir);
    }
}
