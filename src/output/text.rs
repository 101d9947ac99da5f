//! Human-readable text output formatter

use super::OutputFormatter;
use crate::diagnostic::{Finding, Severity};
use crate::engine::{FixRecord, ModelReport, Report};
use crate::fixer::FixOutcome;
use colored::*;

/// Text formatter with optional color support
pub struct TextFormatter {
    /// Enable colored output
    pub colored: bool,

    /// Show help text, proposed fixes, fix outcomes and passing models
    pub verbose: bool,

    /// Show the summary line
    pub show_stats: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            colored: true,
            verbose: false,
            show_stats: true,
        }
    }
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable colors
    pub fn without_color(mut self) -> Self {
        self.colored = false;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.colored {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn severity_str(&self, severity: Severity) -> String {
        let s = severity.to_string();
        match severity {
            Severity::Error => self.paint(&s, |t| t.red().bold()),
        }
    }

    /// Path of the finding's file relative to its model, with the line
    fn format_location(finding: &Finding) -> Option<String> {
        let file = finding.file.as_ref()?;
        let relative = file.strip_prefix(&finding.model_path).unwrap_or(file);
        Some(match finding.line {
            Some(line) => format!("{}:{}", relative.display(), line),
            None => relative.display().to_string(),
        })
    }

    fn format_fix_record(&self, record: &FixRecord) -> String {
        let outcome = match &record.outcome {
            FixOutcome::Applied => self.paint("fixed", |t| t.green()),
            FixOutcome::Skipped(reason) => {
                self.paint(&format!("skipped ({})", reason), |t| t.yellow())
            }
            FixOutcome::Failed(reason) => {
                self.paint(&format!("failed ({})", reason), |t| t.red())
            }
        };
        format!("  {} [{}] {}\n", outcome, record.rule_id, record.change)
    }

    fn format_model(&self, model: &ModelReport) -> String {
        let mut output = String::new();
        let header = model.path.display().to_string();

        if model.is_passing() {
            output.push_str(&format!(
                "{} {}\n",
                self.paint(&header, |t| t.underline()),
                self.paint("ok", |t| t.green())
            ));
        } else {
            output.push_str(&format!("{}\n", self.paint(&header, |t| t.underline())));
            for finding in &model.findings {
                output.push_str(&self.format_finding(finding));
            }
        }

        if self.verbose {
            for record in &model.fixes {
                output.push_str(&self.format_fix_record(record));
            }
        }
        output
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, report: &Report) -> String {
        let mut output = String::new();

        for model in &report.models {
            if model.is_passing() && !self.verbose {
                continue;
            }
            output.push_str(&self.format_model(model));
            output.push('\n');
        }

        if self.show_stats {
            let models = report.models_scanned();
            let findings = report.total_findings();
            let mut summary = format!(
                "{} {} scanned, {} {}, {} {} applied",
                models,
                if models == 1 { "model" } else { "models" },
                findings,
                if findings == 1 { "finding" } else { "findings" },
                report.fixes_applied,
                if report.fixes_applied == 1 { "fix" } else { "fixes" },
            );
            if report.fixes_failed > 0 {
                summary.push_str(&format!(", {} failed", report.fixes_failed));
            }

            let summary = if findings == 0 {
                self.paint(&summary, |t| t.green().bold())
            } else {
                self.paint(&summary, |t| t.red().bold())
            };
            output.push_str(&summary);
            output.push('\n');

            if self.verbose {
                output.push_str(&format!(
                    "Finished in {:.2}s\n",
                    report.duration.as_secs_f64()
                ));
            }
        }

        output
    }

    fn format_finding(&self, finding: &Finding) -> String {
        let mut output = String::new();

        let location = Self::format_location(finding)
            .map(|l| format!(" {}:", l))
            .unwrap_or_default();
        output.push_str(&format!(
            "  {}[{}]:{} {}\n",
            self.severity_str(finding.severity),
            self.paint(&finding.rule_id, |t| t.cyan()),
            location,
            finding.message
        ));

        if self.verbose {
            if let Some(help) = &finding.help {
                output.push_str(&format!("    {} {}\n", self.paint("= help:", |t| t.blue()), help));
            }
            if let Some(fix) = &finding.fix {
                output.push_str(&format!(
                    "    {} {} ({})\n",
                    self.paint("= fix:", |t| t.green()),
                    fix.description,
                    fix.summary()
                ));
            }
        }

        output
    }
}
