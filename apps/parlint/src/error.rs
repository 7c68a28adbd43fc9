//! Error types for configuration, analysis, and worker supervision.
//!
//! Diagnostics are never errors: they travel inside a `Report`. Everything
//! here aborts the invocation.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid TOML in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid rule level '{0}' (expected off|warn|error|0|1|2)")]
    RuleLevel(String),
    #[error("invalid rule '{0}' (expected name:level)")]
    RuleSpec(String),
    #[error("invalid parser option '{0}' (expected key:value)")]
    ParserOption(String),
    #[error("cannot determine working directory: {0}")]
    Cwd(#[source] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("cannot write fixes to {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("cannot spawn worker {index}: {source}")]
    Spawn { index: usize, source: io::Error },
    #[error("cannot locate worker executable: {0}")]
    Executable(#[source] io::Error),
    #[error("cannot encode dispatch message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("cannot read result of worker {index}: {source}")]
    Read { index: usize, source: io::Error },
    /// A worker exited non-zero. Fatal for the whole invocation.
    #[error("Linting failed: worker {index} exited with {}: {reason}", code.map(|c| format!("code {c}")).unwrap_or_else(|| "a signal".to_string()))]
    Exited {
        index: usize,
        code: Option<i32>,
        reason: String,
    },
    #[error("worker {index} broke protocol: {reason}")]
    Protocol { index: usize, reason: String },
    #[error("worker result channel closed unexpectedly")]
    Disconnected,
}

#[derive(Debug, thiserror::Error)]
pub enum LintError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Worker(#[from] WorkerError),
}
