//! Configuration discovery and options resolution.
//!
//! Parlint reads `parlint.toml|yaml|yml` from the working directory (or the
//! closest ancestor) and merges it with CLI flags into an [`Options`] bundle.
//! Defaults:
//! - `ext`: `[".js"]`
//! - `ignore`: true, `ignore_path`: `<cwd>/.eslintignore`
//! - `inline_config`: true
//! - `cache_location`: `<cwd>/.eslintcache`
//! - every other toggle: false
//!
//! Overrides precedence: CLI > config file > defaults. Rule levels are merged
//! per rule id instead of replaced wholesale.

use crate::checks::RuleLevel;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonVal;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILES: [&str; 3] = ["parlint.toml", "parlint.yaml", "parlint.yml"];
pub const DEFAULT_CACHE_FILE: &str = ".eslintcache";
pub const DEFAULT_IGNORE_FILE: &str = ".eslintignore";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Immutable options bundle handed to the engine and to every worker.
///
/// The orchestration core only looks at `fix`, `quiet`, `cwd`, and the cache
/// fields; everything else is passed through to the engine untouched.
pub struct Options {
    pub cwd: Option<PathBuf>,
    pub envs: Vec<String>,
    pub extensions: Vec<String>,
    pub rules: BTreeMap<String, RuleLevel>,
    pub plugins: Vec<String>,
    pub globals: Vec<String>,
    pub ignore: bool,
    pub ignore_path: Option<String>,
    pub ignore_pattern: Vec<String>,
    pub config_file: Option<String>,
    pub rule_paths: Vec<String>,
    pub use_config_file: bool,
    pub parser: Option<String>,
    pub parser_options: BTreeMap<String, JsonVal>,
    pub cache: bool,
    pub cache_file: Option<String>,
    pub cache_location: Option<String>,
    pub fix: bool,
    pub allow_inline_config: bool,
    pub report_unused_disable_directives: bool,
    pub quiet: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cwd: None,
            envs: Vec::new(),
            extensions: vec![".js".to_string()],
            rules: BTreeMap::new(),
            plugins: Vec::new(),
            globals: Vec::new(),
            ignore: true,
            ignore_path: None,
            ignore_pattern: Vec::new(),
            config_file: None,
            rule_paths: Vec::new(),
            use_config_file: true,
            parser: None,
            parser_options: BTreeMap::new(),
            cache: false,
            cache_file: None,
            cache_location: None,
            fix: false,
            allow_inline_config: true,
            report_unused_disable_directives: false,
            quiet: false,
        }
    }
}

impl Options {
    /// Working directory all relative paths resolve against.
    pub fn cwd(&self) -> PathBuf {
        self.cwd
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Where a cache artifact would live: `cache_file`, then
    /// `cache_location`, then `<cwd>/.eslintcache`.
    pub fn cache_path(&self) -> PathBuf {
        let cwd = self.cwd();
        match self.cache_file.as_ref().or(self.cache_location.as_ref()) {
            Some(p) => cwd.join(p),
            None => cwd.join(DEFAULT_CACHE_FILE),
        }
    }

    pub fn ignore_file(&self) -> PathBuf {
        let cwd = self.cwd();
        match self.ignore_path.as_ref() {
            Some(p) => cwd.join(p),
            None => cwd.join(DEFAULT_IGNORE_FILE),
        }
    }
}

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
/// Partial options as written in `parlint.toml|yaml`, or as given on the CLI.
pub struct ConfigFile {
    pub env: Option<Vec<String>>,
    pub ext: Option<Vec<String>>,
    pub rules: Option<BTreeMap<String, RuleLevel>>,
    pub plugins: Option<Vec<String>>,
    pub globals: Option<Vec<String>>,
    pub ignore: Option<bool>,
    #[serde(rename = "ignorePath")]
    pub ignore_path: Option<String>,
    #[serde(rename = "ignorePattern")]
    pub ignore_pattern: Option<Vec<String>>,
    pub rulesdir: Option<Vec<String>>,
    pub parser: Option<String>,
    #[serde(rename = "parserOptions")]
    pub parser_options: Option<BTreeMap<String, JsonVal>>,
    pub cache: Option<bool>,
    #[serde(rename = "cacheFile")]
    pub cache_file: Option<String>,
    #[serde(rename = "cacheLocation")]
    pub cache_location: Option<String>,
    pub fix: Option<bool>,
    #[serde(rename = "inlineConfig")]
    pub inline_config: Option<bool>,
    #[serde(rename = "reportUnusedDisableDirectives")]
    pub report_unused_disable_directives: Option<bool>,
    pub quiet: Option<bool>,
}

/// Walk upward from `start` looking for a parlint config file.
///
/// Stops at the first directory holding one, or at a `.git` directory.
pub fn detect_config_root(start: &Path) -> Option<PathBuf> {
    let mut cur = start;
    loop {
        if CONFIG_FILES.iter().any(|f| cur.join(f).is_file()) {
            return Some(cur.to_path_buf());
        }
        if cur.join(".git").exists() {
            return None;
        }
        cur = cur.parent()?;
    }
}

/// Parse a config file, choosing TOML or YAML by extension.
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let s = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(&s).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        toml::from_str(&s).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Load the discovered config under `root`, if any.
///
/// A broken discovered file is skipped with a warning rather than failing the
/// run; only an explicitly requested file is a hard error.
pub fn load_config(root: &Path) -> Option<ConfigFile> {
    let path = CONFIG_FILES
        .iter()
        .map(|f| root.join(f))
        .find(|p| p.is_file())?;
    match load_config_file(&path) {
        Ok(cfg) => {
            tracing::debug!(path = %path.display(), "loaded config");
            Some(cfg)
        }
        Err(err) => {
            tracing::warn!("ignoring config: {}", err);
            None
        }
    }
}

/// Resolve the final `Options` from CLI overrides, config, and defaults.
///
/// `config_path` is an explicit `--config`; `lookup` enables discovery.
pub fn resolve_options(
    cli: ConfigFile,
    config_path: Option<&str>,
    lookup: bool,
    cwd: Option<&Path>,
) -> Result<Options, ConfigError> {
    let cwd = match cwd {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().map_err(ConfigError::Cwd)?,
    };
    let cfg = match config_path {
        Some(p) => load_config_file(&cwd.join(p))?,
        None if lookup => detect_config_root(&cwd)
            .and_then(|root| load_config(&root))
            .unwrap_or_default(),
        None => ConfigFile::default(),
    };

    let d = Options::default();
    let mut rules = cfg.rules.unwrap_or_default();
    rules.extend(cli.rules.unwrap_or_default());

    Ok(Options {
        cwd: Some(cwd),
        envs: cli.env.or(cfg.env).unwrap_or(d.envs),
        extensions: cli.ext.or(cfg.ext).unwrap_or(d.extensions),
        rules,
        plugins: cli.plugins.or(cfg.plugins).unwrap_or(d.plugins),
        globals: cli.globals.or(cfg.globals).unwrap_or(d.globals),
        ignore: cli.ignore.or(cfg.ignore).unwrap_or(d.ignore),
        ignore_path: cli.ignore_path.or(cfg.ignore_path),
        ignore_pattern: cli
            .ignore_pattern
            .or(cfg.ignore_pattern)
            .unwrap_or(d.ignore_pattern),
        config_file: config_path.map(str::to_string),
        rule_paths: cli.rulesdir.or(cfg.rulesdir).unwrap_or(d.rule_paths),
        use_config_file: lookup,
        parser: cli.parser.or(cfg.parser),
        parser_options: cli
            .parser_options
            .or(cfg.parser_options)
            .unwrap_or(d.parser_options),
        cache: cli.cache.or(cfg.cache).unwrap_or(d.cache),
        cache_file: cli.cache_file.or(cfg.cache_file),
        cache_location: cli.cache_location.or(cfg.cache_location),
        fix: cli.fix.or(cfg.fix).unwrap_or(d.fix),
        allow_inline_config: cli
            .inline_config
            .or(cfg.inline_config)
            .unwrap_or(d.allow_inline_config),
        report_unused_disable_directives: cli
            .report_unused_disable_directives
            .or(cfg.report_unused_disable_directives)
            .unwrap_or(d.report_unused_disable_directives),
        quiet: cli.quiet.or(cfg.quiet).unwrap_or(d.quiet),
    })
}
