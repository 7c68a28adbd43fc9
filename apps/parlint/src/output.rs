//! Human output for lint reports.
//!
//! `format_results` renders per-file tables; `format_total` renders the
//! closing summary line. Colors are dropped when `NO_COLOR` is set.

use crate::models::{FileReport, Report};
use owo_colors::OwoColorize;

pub fn use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if use_colors() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

struct Row {
    line: String,
    column: String,
    kind: &'static str,
    message: String,
    rule: String,
}

/// Render file reports as aligned tables, skipping files without problems.
pub fn format_results(results: &[FileReport], color: bool) -> String {
    let mut out = String::from("\n");
    for r in results {
        if r.messages.is_empty() {
            continue;
        }
        let rows: Vec<Row> = r
            .messages
            .iter()
            .map(|m| Row {
                line: m.line.to_string(),
                column: m.column.to_string(),
                kind: if m.is_error() { "error" } else { "warning" },
                message: m.message.strip_suffix('.').unwrap_or(&m.message).to_string(),
                rule: m.rule_id.clone().unwrap_or_default(),
            })
            .collect();
        let w_line = rows.iter().map(|x| x.line.len()).max().unwrap_or(0);
        let w_col = rows.iter().map(|x| x.column.len()).max().unwrap_or(0);
        let w_kind = rows.iter().map(|x| x.kind.len()).max().unwrap_or(0);
        let w_msg = rows.iter().map(|x| x.message.chars().count()).max().unwrap_or(0);

        if color {
            out.push_str(&format!("{}\n", r.file_path.underline()));
        } else {
            out.push_str(&format!("{}\n", r.file_path));
        }
        for x in rows {
            let pos = format!("{:>wl$}:{:<wc$}", x.line, x.column, wl = w_line, wc = w_col);
            let kind = format!("{:<w$}", x.kind, w = w_kind);
            let msg = format!("{:<w$}", x.message, w = w_msg);
            let line = if color {
                let kind = if x.kind == "error" {
                    kind.red().to_string()
                } else {
                    kind.yellow().to_string()
                };
                format!("  {}  {}  {}  {}", pos.dimmed(), kind, msg, x.rule.dimmed())
            } else {
                format!("  {}  {}  {}  {}", pos, kind, msg, x.rule)
            };
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// Render the `✖ N problems (E errors, W warnings)` summary line.
pub fn format_total(report: &Report, color: bool) -> String {
    let total = report.error_count + report.warning_count;
    let (problem, error, warning) = if total == 1 {
        ("problem", "error", "warning")
    } else {
        ("problems", "errors", "warnings")
    };
    let text = format!(
        "{} {} ({} {}, {} {})",
        total, problem, report.error_count, error, report.warning_count, warning
    );
    if report.error_count > 0 {
        let s = format!("\u{2716} {}", text);
        if color {
            s.red().bold().to_string()
        } else {
            s
        }
    } else if report.warning_count > 0 {
        let s = format!("\u{2716} {}", text);
        if color {
            s.yellow().bold().to_string()
        } else {
            s
        }
    } else {
        format!(" {}", text)
    }
}

pub fn print_results(report: &Report) {
    println!("{}", format_results(&report.results, use_colors()));
}

pub fn print_total(report: &Report) {
    println!("{}", format_total(report, use_colors()));
}
