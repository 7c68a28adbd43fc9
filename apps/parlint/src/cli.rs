//! CLI argument parsing via `clap`.

use crate::checks::RuleLevel;
use crate::config::ConfigFile;
use crate::error::ConfigError;
use clap::Parser;
use serde_json::Value as JsonVal;
use std::collections::BTreeMap;

#[derive(Parser, Debug, Default)]
#[command(
    name = "parlint",
    disable_version_flag = true,
    about = "Parallel linter: fans large file sets out across worker processes",
    long_about = "Parlint lints the files matched by PATTERN. Above 50 files on a multi-core host the work is split across one worker process per logical CPU, unless a cache file is present.\n\nConfiguration precedence: CLI > parlint.toml > defaults.",
    after_help = "Examples:\n  parlint src/\n  parlint 'lib/**/*.js' --rule no-tabs:error --quiet\n  parlint . --fix --ignore-pattern dist/"
)]
/// Top-level CLI options.
pub struct Cli {
    #[arg(value_name = "PATTERN", help = "Files, directories, or globs to lint")]
    pub patterns: Vec<String>,
    #[arg(long, value_delimiter = ',', help = "Environments to enable")]
    pub env: Vec<String>,
    #[arg(long, value_delimiter = ',', help = "File extensions to lint (default: .js)")]
    pub ext: Vec<String>,
    #[arg(long = "rule", value_name = "RULE:LEVEL", help = "Rule level override, e.g. no-tabs:error")]
    pub rules: Vec<String>,
    #[arg(long = "plugin", help = "Plugins to load")]
    pub plugins: Vec<String>,
    #[arg(long = "global", value_delimiter = ',', help = "Global identifiers to define")]
    pub globals: Vec<String>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Disable ignore files and patterns")]
    pub no_ignore: bool,
    #[arg(long, help = "Ignore file path (default: .eslintignore)")]
    pub ignore_path: Option<String>,
    #[arg(long, help = "Extra ignore pattern (repeatable)")]
    pub ignore_pattern: Vec<String>,
    #[arg(short = 'c', long, help = "Use this config file instead of discovery")]
    pub config: Option<String>,
    #[arg(long, help = "Additional rule directories")]
    pub rulesdir: Vec<String>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Do not look up parlint.toml|yaml")]
    pub no_config_lookup: bool,
    #[arg(long, help = "Parser name")]
    pub parser: Option<String>,
    #[arg(long, value_name = "KEY:VALUE", help = "Parser option (repeatable)")]
    pub parser_options: Vec<String>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Only check changed files")]
    pub cache: bool,
    #[arg(long, help = "Cache file path")]
    pub cache_file: Option<String>,
    #[arg(long, help = "Cache file or directory location (default: .eslintcache)")]
    pub cache_location: Option<String>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Fix problems in place")]
    pub fix: bool,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Ignore parlint-disable comments")]
    pub no_inline_config: bool,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Warn about unused parlint-disable comments")]
    pub report_unused_disable_directives: bool,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Report errors only")]
    pub quiet: bool,
    #[arg(short = 'v', long, action = clap::ArgAction::SetTrue, help = "Print version")]
    pub version: bool,
    #[arg(long, hide = true, action = clap::ArgAction::SetTrue)]
    pub worker: bool,
}

/// Version banner printed by `--version`, e.g. `v0.1.0`.
pub fn version_line() -> String {
    format!("v{}", env!("CARGO_PKG_VERSION"))
}

fn non_empty(v: &[String]) -> Option<Vec<String>> {
    if v.is_empty() {
        None
    } else {
        Some(v.to_vec())
    }
}

fn flag(set: bool, value: bool) -> Option<bool> {
    if set {
        Some(value)
    } else {
        None
    }
}

/// Parse `name:level` rule overrides.
pub fn parse_rules(specs: &[String]) -> Result<BTreeMap<String, RuleLevel>, ConfigError> {
    specs
        .iter()
        .map(|spec| {
            let (name, level) = spec
                .rsplit_once(':')
                .ok_or_else(|| ConfigError::RuleSpec(spec.clone()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigError::RuleSpec(spec.clone()));
            }
            Ok((name.to_string(), level.parse()?))
        })
        .collect()
}

/// Parse `key:value` parser options; values are JSON when they parse as such.
pub fn parse_parser_options(specs: &[String]) -> Result<BTreeMap<String, JsonVal>, ConfigError> {
    specs
        .iter()
        .map(|spec| {
            let (k, v) = spec
                .split_once(':')
                .ok_or_else(|| ConfigError::ParserOption(spec.clone()))?;
            let v = v.trim();
            let val = serde_json::from_str(v).unwrap_or_else(|_| JsonVal::String(v.to_string()));
            Ok((k.trim().to_string(), val))
        })
        .collect()
}

impl Cli {
    /// CLI flags as config overrides. Unset flags stay `None` so config and
    /// defaults can fill them.
    pub fn overrides(&self) -> Result<ConfigFile, ConfigError> {
        Ok(ConfigFile {
            env: non_empty(&self.env),
            ext: non_empty(&self.ext),
            rules: Some(parse_rules(&self.rules)?).filter(|m| !m.is_empty()),
            plugins: non_empty(&self.plugins),
            globals: non_empty(&self.globals),
            ignore: flag(self.no_ignore, false),
            ignore_path: self.ignore_path.clone(),
            ignore_pattern: non_empty(&self.ignore_pattern),
            rulesdir: non_empty(&self.rulesdir),
            parser: self.parser.clone(),
            parser_options: Some(parse_parser_options(&self.parser_options)?)
                .filter(|m| !m.is_empty()),
            cache: flag(self.cache, true),
            cache_file: self.cache_file.clone(),
            cache_location: self.cache_location.clone(),
            fix: flag(self.fix, true),
            inline_config: flag(self.no_inline_config, false),
            report_unused_disable_directives: flag(self.report_unused_disable_directives, true),
            quiet: flag(self.quiet, true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("parlint").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_patterns_and_flags() {
        let cli = parse(&[
            "src",
            "lib/**/*.js",
            "--ext",
            ".js,.mjs",
            "--rule",
            "no-tabs:error",
            "--rule",
            "eol-last:0",
            "--fix",
            "--no-inline-config",
        ]);
        assert_eq!(cli.patterns, vec!["src", "lib/**/*.js"]);
        let ov = cli.overrides().unwrap();
        assert_eq!(ov.ext.unwrap(), vec![".js", ".mjs"]);
        let rules = ov.rules.unwrap();
        assert_eq!(rules["no-tabs"], RuleLevel::Error);
        assert_eq!(rules["eol-last"], RuleLevel::Off);
        assert_eq!(ov.fix, Some(true));
        assert_eq!(ov.inline_config, Some(false));
        assert_eq!(ov.quiet, None);
        assert_eq!(ov.ignore, None);
    }

    #[test]
    fn test_bad_rule_spec_is_rejected() {
        let cli = parse(&["--rule", "no-tabs"]);
        assert!(matches!(cli.overrides(), Err(ConfigError::RuleSpec(_))));
        let cli = parse(&["--rule", "no-tabs:loud"]);
        assert!(matches!(cli.overrides(), Err(ConfigError::RuleLevel(_))));
    }

    #[test]
    fn test_parser_options_parse_json_values() {
        let opts = parse_parser_options(&[
            "ecmaVersion:2020".to_string(),
            "sourceType: module".to_string(),
        ])
        .unwrap();
        assert_eq!(opts["ecmaVersion"], serde_json::json!(2020));
        assert_eq!(opts["sourceType"], serde_json::json!("module"));
    }

    #[test]
    fn test_version_flag_and_banner() {
        assert!(parse(&["--version"]).version);
        assert!(parse(&["-v"]).version);
        assert_eq!(version_line(), format!("v{}", env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_worker_flag_is_accepted() {
        assert!(parse(&["--worker"]).worker);
        assert!(!parse(&[]).worker);
    }
}
