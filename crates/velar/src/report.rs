//! Run reporting: per-case rows rendered to HTML and JSON.
//!
//! Row schema: name, status (PASS | FAIL | SKIP), duration, captured step
//! log, error message if any.

use crate::result::VelarResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

/// Outcome of one test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    /// Case completed without a failure
    Pass,
    /// Case raised a described failure
    Fail,
    /// Case was not executed
    Skip,
}

impl TestStatus {
    /// Report label
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Skip => "SKIP",
        }
    }

    /// Whether this status is a pass
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One report row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseReport {
    /// Test case name
    pub name: String,
    /// Outcome
    pub status: TestStatus,
    /// Wall-clock duration
    pub duration: Duration,
    /// Captured step log lines
    pub steps: Vec<String>,
    /// Error message for failed cases
    pub error: Option<String>,
}

impl CaseReport {
    /// Create a passing row
    #[must_use]
    pub fn passed(name: impl Into<String>, duration: Duration, steps: Vec<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Pass,
            duration,
            steps,
            error: None,
        }
    }

    /// Create a failing row
    #[must_use]
    pub fn failed(
        name: impl Into<String>,
        duration: Duration,
        steps: Vec<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Fail,
            duration,
            steps,
            error: Some(error.into()),
        }
    }

    /// Create a skipped row
    #[must_use]
    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Skip,
            duration: Duration::ZERO,
            steps: vec![format!("Skipped: {}", reason.into())],
            error: None,
        }
    }
}

/// A full verification run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Run identifier
    pub run_id: Uuid,
    /// Suite name
    pub suite: String,
    /// Generation timestamp
    pub generated_at: DateTime<Utc>,
    /// Per-case rows
    pub cases: Vec<CaseReport>,
}

impl RunReport {
    /// Create an empty report for a suite
    #[must_use]
    pub fn new(suite: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            suite: suite.into(),
            generated_at: Utc::now(),
            cases: Vec::new(),
        }
    }

    /// Append a case row
    pub fn record(&mut self, case: CaseReport) {
        self.cases.push(case);
    }

    /// Count of passing cases
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.cases
            .iter()
            .filter(|c| c.status == TestStatus::Pass)
            .count()
    }

    /// Count of failing cases
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.cases
            .iter()
            .filter(|c| c.status == TestStatus::Fail)
            .count()
    }

    /// Count of skipped cases
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.cases
            .iter()
            .filter(|c| c.status == TestStatus::Skip)
            .count()
    }

    /// Whether no case failed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {} passed, {} failed, {} skipped",
            self.suite,
            self.passed_count(),
            self.failed_count(),
            self.skipped_count()
        )
    }

    /// Write the HTML report
    ///
    /// # Errors
    ///
    /// Returns error if file writing fails
    pub fn write_html(&self, output_path: &Path) -> VelarResult<()> {
        std::fs::write(output_path, self.render_html())?;
        Ok(())
    }

    /// Write the JSON export of the same rows
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file writing fails
    pub fn write_json(&self, output_path: &Path) -> VelarResult<()> {
        std::fs::write(output_path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    /// Render the HTML report content
    #[must_use]
    pub fn render_html(&self) -> String {
        let mut html = String::new();
        html.push_str(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Verification Run Report</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #f4f7f6; margin: 0; padding: 20px; }
        .container { max-width: 1000px; margin: 0 auto; background: #fff; padding: 20px; box-shadow: 0 2px 5px rgba(0,0,0,0.1); border-radius: 8px; }
        h1 { color: #333; border-bottom: 2px solid #007bff; padding-bottom: 10px; }
        .summary { display: flex; justify-content: space-around; margin-bottom: 20px; background: #fafafa; padding: 15px; border-radius: 5px; }
        .summary-item { text-align: center; }
        .summary-value { font-size: 24px; font-weight: bold; }
        .pass { color: #28a745; } .fail { color: #dc3545; } .skip { color: #ffc107; }
        table { width: 100%; border-collapse: collapse; margin-top: 20px; }
        th, td { padding: 12px; text-align: left; border-bottom: 1px solid #ddd; vertical-align: top; }
        th { background-color: #007bff; color: white; }
        .status-pass { background: #d4edda; color: #155724; padding: 5px 10px; border-radius: 4px; font-weight: bold; }
        .status-fail { background: #f8d7da; color: #721c24; padding: 5px 10px; border-radius: 4px; font-weight: bold; }
        .status-skip { background: #fff3cd; color: #856404; padding: 5px 10px; border-radius: 4px; font-weight: bold; }
        .steps { font-family: monospace; font-size: 0.9em; background: #f8f9fa; padding: 10px; border-radius: 4px; border: 1px solid #e9ecef; }
        .error { color: #d32f2f; font-family: monospace; white-space: pre-wrap; }
    </style>
</head>
<body>
<div class='container'>
"#,
        );

        html.push_str(&format!("<h1>{}</h1>\n", escape(&self.suite)));
        html.push_str(&format!(
            "<p>Run {} — generated {}</p>\n",
            self.run_id,
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        html.push_str("<div class='summary'>\n");
        for (value, label, class) in [
            (self.cases.len(), "Total", ""),
            (self.passed_count(), "Passed", " pass"),
            (self.failed_count(), "Failed", " fail"),
            (self.skipped_count(), "Skipped", " skip"),
        ] {
            html.push_str(&format!(
                "<div class='summary-item'><div class='summary-value{class}'>{value}</div><div>{label}</div></div>\n"
            ));
        }
        html.push_str("</div>\n");

        html.push_str(
            "<table>\n<thead><tr><th>Test Name</th><th>Status</th><th>Duration (ms)</th>\
             <th>Steps &amp; Logs</th></tr></thead>\n<tbody>\n",
        );
        for case in &self.cases {
            let status_class = match case.status {
                TestStatus::Pass => "status-pass",
                TestStatus::Fail => "status-fail",
                TestStatus::Skip => "status-skip",
            };
            html.push_str("<tr>");
            html.push_str(&format!("<td>{}</td>", escape(&case.name)));
            html.push_str(&format!(
                "<td><span class='{status_class}'>{}</span></td>",
                case.status
            ));
            html.push_str(&format!("<td>{}</td>", case.duration.as_millis()));
            html.push_str("<td><div class='steps'>");
            if case.steps.is_empty() {
                html.push_str("No steps recorded.");
            } else {
                for step in &case.steps {
                    html.push_str(&escape(step));
                    html.push_str("<br>");
                }
            }
            if let Some(error) = &case.error {
                html.push_str(&format!(
                    "<br><strong>Error:</strong> <span class='error'>{}</span>",
                    escape(error)
                ));
            }
            html.push_str("</div></td></tr>\n");
        }
        html.push_str("</tbody></table>\n</div>\n</body>\n</html>\n");
        html
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn sample_report() -> RunReport {
        let mut report = RunReport::new("Careers Verification");
        report.record(CaseReport::passed(
            "home page opens",
            Duration::from_millis(1200),
            vec!["[+0.0s] Navigating to home page".into()],
        ));
        report.record(CaseReport::failed(
            "listing filters correctly",
            Duration::from_millis(3400),
            vec!["[+0.1s] Filtering listing".into()],
            "Assertion mismatch for location: expected 'Istanbul, Turkiye', actual 'Izmir, Turkiye'",
        ));
        report.record(CaseReport::skipped("navigation targets", "disabled"));
        report
    }

    #[test]
    fn test_counts_and_summary() {
        let report = sample_report();
        assert_eq!(report.passed_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.skipped_count(), 1);
        assert!(!report.all_passed());
        assert!(report.summary().contains("1 passed, 1 failed, 1 skipped"));
    }

    #[test]
    fn test_html_has_one_row_per_case_with_status_labels() {
        let html = sample_report().render_html();
        assert_eq!(html.matches("<tr>").count(), 1 + 3, "header plus one per case");
        assert!(html.contains("PASS"));
        assert!(html.contains("FAIL"));
        assert!(html.contains("SKIP"));
        assert!(html.contains("Izmir, Turkiye"));
        assert!(html.contains("Navigating to home page"));
    }

    #[test]
    fn test_html_escapes_markup_in_messages() {
        let mut report = RunReport::new("suite");
        report.record(CaseReport::failed(
            "case",
            Duration::ZERO,
            vec![],
            "expected <div> & got <span>",
        ));
        let html = report.render_html();
        assert!(html.contains("&lt;div&gt; &amp; got &lt;span&gt;"));
        assert!(!html.contains("got <span>"));
    }

    #[test]
    fn test_write_html_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();
        let html_path = dir.path().join("report.html");
        let json_path = dir.path().join("report.json");
        report.write_html(&html_path).unwrap();
        report.write_json(&json_path).unwrap();

        let json = std::fs::read_to_string(&json_path).unwrap();
        let parsed: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.cases.len(), 3);
        assert_eq!(parsed.cases[1].status, TestStatus::Fail);
        assert!(std::fs::read_to_string(&html_path)
            .unwrap()
            .contains("Careers Verification"));
    }
}
