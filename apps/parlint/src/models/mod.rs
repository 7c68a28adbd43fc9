//! Shared data models for lint reports and the worker message contract.

pub mod message;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Severity of a single finding.
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A single finding produced by the analysis engine.
pub struct Diagnostic {
    pub severity: Severity,
    pub line: usize,
    pub column: usize,
    pub message: String,
    #[serde(default, rename = "ruleId", skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    /// Set when the file could not be analyzed at all (unreadable, not text).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fatal: bool,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.fatal || self.severity == Severity::Error
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Diagnostics for one file, in the order the engine produced them.
pub struct FileReport {
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(default)]
    pub messages: Vec<Diagnostic>,
    /// Fixed source text, present only when fixes changed the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl FileReport {
    pub fn new(file_path: impl Into<String>, messages: Vec<Diagnostic>) -> Self {
        Self {
            file_path: file_path.into(),
            messages,
            output: None,
        }
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.messages.len() - self.error_count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Aggregate lint report: totals plus per-file details.
///
/// `error_count` and `warning_count` always equal the number of error and
/// warning diagnostics across `results`. Build reports with [`Report::new`]
/// or [`crate::aggregate::merge`] to keep that true.
pub struct Report {
    #[serde(rename = "errorCount")]
    pub error_count: usize,
    #[serde(rename = "warningCount")]
    pub warning_count: usize,
    #[serde(default)]
    pub results: Vec<FileReport>,
}

impl Report {
    pub fn new(results: Vec<FileReport>) -> Self {
        let error_count = results.iter().map(FileReport::error_count).sum();
        let warning_count = results.iter().map(FileReport::warning_count).sum();
        Self {
            error_count,
            warning_count,
            results,
        }
    }

    /// Whether the totals agree with the per-file diagnostics.
    pub fn is_consistent(&self) -> bool {
        let errors: usize = self.results.iter().map(FileReport::error_count).sum();
        let warnings: usize = self.results.iter().map(FileReport::warning_count).sum();
        errors == self.error_count && warnings == self.warning_count
    }

    pub fn has_problems(&self) -> bool {
        self.error_count > 0 || self.warning_count > 0
    }

    /// Keep only files with at least one error, and only their errors.
    pub fn into_errors_only(self) -> Report {
        let results = self
            .results
            .into_iter()
            .filter(|r| r.error_count() > 0)
            .map(|mut r| {
                r.messages.retain(Diagnostic::is_error);
                r
            })
            .collect();
        Report::new(results)
    }
}
