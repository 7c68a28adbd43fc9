//! Orchestrator ↔ worker message contract.
//!
//! One `Dispatch` goes to the worker on stdin; one `WorkerOutcome` comes back
//! on stdout. Both are single JSON documents.

use crate::config::Options;
use crate::models::Report;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispatch {
    pub options: Options,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "body", rename_all = "lowercase")]
/// Result of a worker run. The process exit code is derived from the tag.
pub enum WorkerOutcome {
    Report(Report),
    Fatal { reason: String },
}

impl WorkerOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            WorkerOutcome::Report(_) => 0,
            WorkerOutcome::Fatal { .. } => 1,
        }
    }
}
