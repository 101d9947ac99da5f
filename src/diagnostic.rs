//! Finding and fix types produced by rule checks

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Rule id used for findings raised when a package could not be scanned
pub const SCAN_ERROR_RULE: &str = "scan-error";

/// Severity level for findings
///
/// Every current rule reports at `Error`; there is no warning tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Error - the package breaks a convention
    #[default]
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(Severity::Error),
            _ => Err(()),
        }
    }
}

/// Concrete mutation proposed by a fix
///
/// Fixes are plain data so the applier can verify the on-disk state still
/// matches before touching anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum FixAction {
    /// Rename a file or directory
    Rename { from: PathBuf, to: PathBuf },
    /// Replace the byte range `start..end` of `file`, which must hold `expected`
    ReplaceSpan {
        file: PathBuf,
        start: usize,
        end: usize,
        expected: String,
        replacement: String,
    },
}

impl FixAction {
    /// Path this action reads or writes
    pub fn target(&self) -> &Path {
        match self {
            FixAction::Rename { from, .. } => from,
            FixAction::ReplaceSpan { file, .. } => file,
        }
    }
}

/// A proposed (not yet applied) correction for a finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fix {
    /// Description of the fix
    pub description: String,
    /// What to change on disk
    #[serde(flatten)]
    pub action: FixAction,
}

impl Fix {
    /// Propose renaming `from` to `to`
    pub fn rename(description: &str, from: PathBuf, to: PathBuf) -> Self {
        Self {
            description: description.to_string(),
            action: FixAction::Rename { from, to },
        }
    }

    /// Propose replacing a byte span of a file
    pub fn replace_span(
        description: &str,
        file: PathBuf,
        span: std::ops::Range<usize>,
        expected: &str,
        replacement: &str,
    ) -> Self {
        Self {
            description: description.to_string(),
            action: FixAction::ReplaceSpan {
                file,
                start: span.start,
                end: span.end,
                expected: expected.to_string(),
                replacement: replacement.to_string(),
            },
        }
    }

    /// Short "old -> new" rendering used by formatters
    pub fn summary(&self) -> String {
        match &self.action {
            FixAction::Rename { from, to } => format!(
                "{} -> {}",
                from.file_name().unwrap_or_default().to_string_lossy(),
                to.file_name().unwrap_or_default().to_string_lossy()
            ),
            FixAction::ReplaceSpan {
                expected,
                replacement,
                ..
            } => format!("'{}' -> '{}'", expected.trim(), replacement.trim()),
        }
    }
}

/// A single rule violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Rule ID that produced this finding
    pub rule_id: String,
    /// Severity level
    pub severity: Severity,
    /// Model package the finding belongs to
    pub model_path: PathBuf,
    /// Human-readable message
    pub message: String,
    /// Specific file inside the package, when the finding is about one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Line number (1-based) inside `file`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Help text (usually the rule description)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Suggested fix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<Fix>,
}

impl Finding {
    /// Create a new error finding
    pub fn new(rule_id: &str, model_path: &Path, message: &str) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity: Severity::Error,
            model_path: model_path.to_path_buf(),
            message: message.to_string(),
            file: None,
            line: None,
            help: None,
            fix: None,
        }
    }

    /// Finding for a package that could not be scanned
    pub fn scan_error(model_path: &Path, message: &str) -> Self {
        Self::new(SCAN_ERROR_RULE, model_path, message)
    }

    /// Attach the file the finding is about
    pub fn with_file(mut self, file: &Path) -> Self {
        self.file = Some(file.to_path_buf());
        self
    }

    /// Attach a line number
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Add help text
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Attach a proposed fix
    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }

    /// Check if this finding has a fix attached
    pub fn is_fixable(&self) -> bool {
        self.fix.is_some()
    }

    /// Check if this finding reports a scan failure rather than a rule violation
    pub fn is_scan_error(&self) -> bool {
        self.rule_id == SCAN_ERROR_RULE
    }
}
