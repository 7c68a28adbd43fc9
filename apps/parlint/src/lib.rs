//! Parlint core library.
//!
//! Lints JavaScript sources and, for large file sets, spreads the work over
//! one worker process per logical CPU before merging the partial reports.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Config discovery and options resolution.
//! - `resolve`: Expansion of patterns into a concrete file list.
//! - `partition`: Single-vs-distributed decision and file splitting.
//! - `supervisor`: Worker process spawning, collection, and teardown.
//! - `worker`: Worker-side entry point.
//! - `aggregate`: Merging of partial reports.
//! - `linter`: Orchestration from patterns to a final report.
//! - `engine` / `checks`: The built-in analysis engine and its rules.
//! - `models`: Report types and the worker message contract.
//! - `output`: Human printers for results and totals.
//! - `error`: Error types.
pub mod aggregate;
pub mod checks;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod linter;
pub mod models;
pub mod output;
pub mod partition;
pub mod resolve;
pub mod supervisor;
pub mod worker;
