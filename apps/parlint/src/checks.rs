//! Built-in line rules and inline disable directives.
//!
//! Every rule works on plain text lines, so the engine is language agnostic.
//! Levels come from `Options::rules`; anything not configured falls back to
//! the default in [`RULES`].

use crate::error::{ConfigError, EngineError};
use crate::models::Severity;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

pub const MAX_LINE_LENGTH: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "LevelRepr")]
/// Configured level of a rule.
pub enum RuleLevel {
    Off,
    Warn,
    Error,
}

impl RuleLevel {
    pub fn severity(self) -> Option<Severity> {
        match self {
            RuleLevel::Off => None,
            RuleLevel::Warn => Some(Severity::Warning),
            RuleLevel::Error => Some(Severity::Error),
        }
    }
}

impl FromStr for RuleLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "0" => Ok(RuleLevel::Off),
            "warn" | "warning" | "1" => Ok(RuleLevel::Warn),
            "error" | "2" => Ok(RuleLevel::Error),
            other => Err(ConfigError::RuleLevel(other.to_string())),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Num(u8),
    Name(String),
}

impl TryFrom<LevelRepr> for RuleLevel {
    type Error = ConfigError;

    fn try_from(v: LevelRepr) -> Result<Self, ConfigError> {
        match v {
            LevelRepr::Num(n) => n.to_string().parse(),
            LevelRepr::Name(s) => s.parse(),
        }
    }
}

/// Static description of a built-in rule.
pub struct RuleDef {
    pub id: &'static str,
    pub default: RuleLevel,
    pub fixable: bool,
}

pub const RULES: &[RuleDef] = &[
    RuleDef { id: "no-trailing-spaces", default: RuleLevel::Warn, fixable: true },
    RuleDef { id: "eol-last", default: RuleLevel::Warn, fixable: true },
    RuleDef { id: "no-debugger", default: RuleLevel::Error, fixable: false },
    RuleDef { id: "no-tabs", default: RuleLevel::Off, fixable: false },
    RuleDef { id: "max-len", default: RuleLevel::Off, fixable: false },
    RuleDef { id: "no-console", default: RuleLevel::Off, fixable: false },
];

/// Rules enabled for one analysis call, with their effective severity.
#[derive(Debug, Clone, Default)]
pub struct ActiveRules {
    levels: BTreeMap<&'static str, Severity>,
}

impl ActiveRules {
    /// Apply configured overrides on top of rule defaults. Unknown rule ids
    /// are ignored here; the engine has no rule to run for them.
    pub fn resolve(overrides: &BTreeMap<String, RuleLevel>) -> Self {
        let levels = RULES
            .iter()
            .filter_map(|def| {
                let level = overrides.get(def.id).copied().unwrap_or(def.default);
                level.severity().map(|sev| (def.id, sev))
            })
            .collect();
        Self { levels }
    }

    pub fn severity(&self, rule: &str) -> Option<Severity> {
        self.levels.get(rule).copied()
    }

    pub fn is_on(&self, rule: &str) -> bool {
        self.levels.contains_key(rule)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A rule violation before directive filtering.
pub struct Finding {
    pub rule: &'static str,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Compiled patterns shared by every file of an analysis call.
pub struct Matchers {
    debugger: Regex,
    console: Regex,
    directive: Regex,
}

impl Matchers {
    pub fn new() -> Result<Self, EngineError> {
        Ok(Self {
            debugger: Regex::new(r"\bdebugger\b")?,
            console: Regex::new(r"\bconsole\.(log|warn|error|info|debug|trace)\b")?,
            directive: Regex::new(r"parlint-disable-(next-line|line)\b([A-Za-z0-9_/,@\s-]*)")?,
        })
    }

    /// Run every enabled rule over `source`, in line then column order.
    pub fn run_checks(&self, source: &str, rules: &ActiveRules) -> Vec<Finding> {
        let mut out = Vec::new();
        let mut last_line = 0usize;
        for (idx, raw) in source.lines().enumerate() {
            let number = idx + 1;
            last_line = number;
            let line = raw.strip_suffix('\r').unwrap_or(raw);

            if rules.is_on("no-trailing-spaces") {
                let trimmed = line.trim_end_matches([' ', '\t']);
                if trimmed.len() != line.len() {
                    out.push(Finding {
                        rule: "no-trailing-spaces",
                        line: number,
                        column: trimmed.chars().count() + 1,
                        message: "Trailing spaces not allowed.".into(),
                    });
                }
            }
            if rules.is_on("no-tabs") {
                if let Some(pos) = line.find('\t') {
                    out.push(Finding {
                        rule: "no-tabs",
                        line: number,
                        column: line[..pos].chars().count() + 1,
                        message: "Unexpected tab character.".into(),
                    });
                }
            }
            if rules.is_on("max-len") {
                let len = line.chars().count();
                if len > MAX_LINE_LENGTH {
                    out.push(Finding {
                        rule: "max-len",
                        line: number,
                        column: 1,
                        message: format!(
                            "This line has a length of {}. Maximum allowed is {}.",
                            len, MAX_LINE_LENGTH
                        ),
                    });
                }
            }
            if rules.is_on("no-debugger") {
                if let Some(m) = self.debugger.find(line) {
                    out.push(Finding {
                        rule: "no-debugger",
                        line: number,
                        column: line[..m.start()].chars().count() + 1,
                        message: "Unexpected 'debugger' statement.".into(),
                    });
                }
            }
            if rules.is_on("no-console") {
                if let Some(m) = self.console.find(line) {
                    out.push(Finding {
                        rule: "no-console",
                        line: number,
                        column: line[..m.start()].chars().count() + 1,
                        message: "Unexpected console statement.".into(),
                    });
                }
            }
        }
        if rules.is_on("eol-last") && !source.is_empty() && !source.ends_with('\n') {
            let tail = source.rsplit('\n').next().unwrap_or_default();
            out.push(Finding {
                rule: "eol-last",
                line: last_line,
                column: tail.chars().count() + 1,
                message: "Newline required at end of file but not found.".into(),
            });
        }
        out.sort_by(|a, b| a.line.cmp(&b.line).then(a.column.cmp(&b.column)));
        out
    }

    /// Collect `parlint-disable-line` / `parlint-disable-next-line` comments.
    pub fn directives(&self, source: &str) -> Vec<Directive> {
        let mut out = Vec::new();
        for (idx, line) in source.lines().enumerate() {
            let number = idx + 1;
            for cap in self.directive.captures_iter(line) {
                let (Some(kind), Some(whole)) = (cap.get(1), cap.get(0)) else {
                    continue;
                };
                let rules = cap
                    .get(2)
                    .map(|m| {
                        m.as_str()
                            .split(|c: char| c == ',' || c.is_whitespace())
                            .filter(|s| !s.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                let target = if kind.as_str() == "next-line" {
                    number + 1
                } else {
                    number
                };
                out.push(Directive {
                    line: number,
                    column: line[..whole.start()].chars().count() + 1,
                    target,
                    rules,
                    used: false,
                });
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// An inline comment suppressing findings on one line.
pub struct Directive {
    pub line: usize,
    pub column: usize,
    /// Line the directive applies to.
    pub target: usize,
    /// Empty means every rule.
    pub rules: Vec<String>,
    pub used: bool,
}

impl Directive {
    fn covers(&self, f: &Finding) -> bool {
        self.target == f.line && (self.rules.is_empty() || self.rules.iter().any(|r| r == f.rule))
    }
}

/// Drop findings covered by a directive, marking those directives as used.
pub fn suppress(findings: Vec<Finding>, directives: &mut [Directive]) -> Vec<Finding> {
    findings
        .into_iter()
        .filter(|f| {
            let mut hit = false;
            for d in directives.iter_mut().filter(|d| d.covers(f)) {
                d.used = true;
                hit = true;
            }
            !hit
        })
        .collect()
}

/// Apply every enabled fixable rule. Line endings are preserved.
pub fn fix_source(source: &str, rules: &ActiveRules) -> String {
    let mut out = String::with_capacity(source.len() + 1);
    if rules.is_on("no-trailing-spaces") {
        for chunk in source.split_inclusive('\n') {
            let (body, ending) = if let Some(b) = chunk.strip_suffix("\r\n") {
                (b, "\r\n")
            } else if let Some(b) = chunk.strip_suffix('\n') {
                (b, "\n")
            } else {
                (chunk, "")
            };
            out.push_str(body.trim_end_matches([' ', '\t']));
            out.push_str(ending);
        }
    } else {
        out.push_str(source);
    }
    if rules.is_on("eol-last") && !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
