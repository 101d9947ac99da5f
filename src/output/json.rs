//! JSON output formatter

use super::OutputFormatter;
use crate::diagnostic::Finding;
use crate::engine::{ModelReport, Report};
use serde::Serialize;
use std::collections::BTreeMap;

/// JSON formatter for machine-readable output
#[derive(Default)]
pub struct JsonFormatter {
    /// Pretty print with indentation
    pub pretty: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn render<T: Serialize>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_default()
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    root: String,
    models: &'a [ModelReport],
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonSummary {
    models_scanned: usize,
    models_passing: usize,
    findings: usize,
    scan_errors: usize,
    by_rule: BTreeMap<String, usize>,
    fixes_applied: usize,
    fixes_failed: usize,
    fixes_skipped: usize,
    duration_ms: u128,
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &Report) -> String {
        let output = JsonOutput {
            root: report.root.display().to_string(),
            models: &report.models,
            summary: JsonSummary {
                models_scanned: report.models_scanned(),
                models_passing: report.passing_models(),
                findings: report.total_findings(),
                scan_errors: report.scan_errors(),
                by_rule: report.counts_by_rule(),
                fixes_applied: report.fixes_applied,
                fixes_failed: report.fixes_failed,
                fixes_skipped: report.fixes_skipped,
                duration_ms: report.duration.as_millis(),
            },
        };
        self.render(&output)
    }

    fn format_finding(&self, finding: &Finding) -> String {
        self.render(finding)
    }
}
