//! Output formatters for validation reports

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::diagnostic::Finding;
use crate::engine::Report;

/// Output formatter trait
pub trait OutputFormatter: Send + Sync {
    /// Format a whole report
    fn format(&self, report: &Report) -> String;

    /// Format a single finding
    fn format_finding(&self, finding: &Finding) -> String;
}
