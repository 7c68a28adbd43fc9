//! Analysis engine seam.
//!
//! The orchestrator only needs `analyze` and `output_fixes`. The built-in
//! engine applies the line rules from [`crate::checks`]; anything else that
//! implements [`AnalysisEngine`] can be dropped in.

use crate::checks::{fix_source, suppress, ActiveRules, Matchers};
use crate::config::Options;
use crate::error::EngineError;
use crate::models::{Diagnostic, FileReport, Report, Severity};
use std::fs;

pub trait AnalysisEngine {
    /// Analyze exactly `files`, in order. Per-file problems (including
    /// unreadable files) are diagnostics, never errors.
    fn analyze(&self, files: &[String], options: &Options) -> Result<Report, EngineError>;

    /// Write the fixed `output` of each file report back to disk.
    fn output_fixes(&self, report: &Report, options: &Options) -> Result<(), EngineError>;
}

/// Line-rule engine shipped with the binary.
pub struct BuiltinEngine {
    matchers: Matchers,
}

impl BuiltinEngine {
    pub fn new() -> Result<Self, EngineError> {
        Ok(Self {
            matchers: Matchers::new()?,
        })
    }

    fn analyze_file(&self, path: &str, options: &Options, rules: &ActiveRules) -> FileReport {
        let full = options.cwd().join(path);
        let bytes = match fs::read(&full) {
            Ok(b) => b,
            Err(e) => return FileReport::new(path, vec![fatal(format!("Cannot read file: {}", e))]),
        };
        let Ok(mut source) = String::from_utf8(bytes) else {
            return FileReport::new(path, vec![fatal("File is not valid UTF-8 text.".into())]);
        };

        let mut output = None;
        if options.fix {
            let fixed = fix_source(&source, rules);
            if fixed != source {
                source = fixed;
                output = Some(source.clone());
            }
        }

        let mut findings = self.matchers.run_checks(&source, rules);
        let mut unused = Vec::new();
        if options.allow_inline_config {
            let mut directives = self.matchers.directives(&source);
            findings = suppress(findings, &mut directives);
            if options.report_unused_disable_directives {
                unused = directives.into_iter().filter(|d| !d.used).collect();
            }
        }

        let mut messages: Vec<Diagnostic> = findings
            .into_iter()
            .filter_map(|f| {
                let severity = rules.severity(f.rule)?;
                Some(Diagnostic {
                    severity,
                    line: f.line,
                    column: f.column,
                    message: f.message,
                    rule_id: Some(f.rule.to_string()),
                    fatal: false,
                })
            })
            .collect();
        messages.extend(unused.into_iter().map(|d| Diagnostic {
            severity: Severity::Warning,
            line: d.line,
            column: d.column,
            message: if d.rules.is_empty() {
                "Unused parlint-disable directive (no problems were reported).".to_string()
            } else {
                format!(
                    "Unused parlint-disable directive (no problems were reported from '{}').",
                    d.rules.join("', '")
                )
            },
            rule_id: None,
            fatal: false,
        }));
        messages.sort_by(|a, b| a.line.cmp(&b.line).then(a.column.cmp(&b.column)));

        let mut report = FileReport::new(path, messages);
        report.output = output;
        report
    }
}

fn fatal(message: String) -> Diagnostic {
    Diagnostic {
        severity: Severity::Error,
        line: 0,
        column: 0,
        message,
        rule_id: None,
        fatal: true,
    }
}

impl AnalysisEngine for BuiltinEngine {
    fn analyze(&self, files: &[String], options: &Options) -> Result<Report, EngineError> {
        let rules = ActiveRules::resolve(&options.rules);
        let results = files
            .iter()
            .map(|f| self.analyze_file(f, options, &rules))
            .collect();
        Ok(Report::new(results))
    }

    fn output_fixes(&self, report: &Report, options: &Options) -> Result<(), EngineError> {
        let cwd = options.cwd();
        for r in &report.results {
            if let Some(out) = &r.output {
                let path = cwd.join(&r.file_path);
                fs::write(&path, out).map_err(|source| EngineError::Write { path, source })?;
                tracing::debug!(file = %r.file_path, "wrote fixes");
            }
        }
        Ok(())
    }
}
