//! Distribution decision and static partitioning of the file set.

use crate::config::Options;
use std::fs;

/// Above this many files a multi-core host fans out to worker processes.
pub const DISTRIBUTION_THRESHOLD: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A contiguous slice of the file set handled by one worker.
pub struct Partition {
    pub index: usize,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Distribution {
    Single,
    Distributed(Vec<Partition>),
}

/// Whether a cache artifact exists at the configured cache location.
///
/// Only existence matters. Workers never share a cache, so its presence
/// forces a single-process run.
pub fn has_cache_artifact(options: &Options) -> bool {
    fs::metadata(options.cache_path()).is_ok()
}

/// Decide how to run `files` on a host with `cpus` logical processors.
pub fn decide(files: &[String], options: &Options, cpus: usize) -> Distribution {
    if has_cache_artifact(options) {
        tracing::debug!(cache = %options.cache_path().display(), "cache present, running single-process");
        return Distribution::Single;
    }
    if files.len() > DISTRIBUTION_THRESHOLD && cpus >= 2 {
        return Distribution::Distributed(split(files, cpus));
    }
    Distribution::Single
}

/// Split into chunks of `ceil(len / workers)`, keeping file order.
///
/// The last partition may be smaller, and there may be fewer partitions than
/// workers when the division leaves nothing for the tail.
pub fn split(files: &[String], workers: usize) -> Vec<Partition> {
    if files.is_empty() {
        return Vec::new();
    }
    let chunk = files.len().div_ceil(workers.max(1));
    files
        .chunks(chunk)
        .enumerate()
        .map(|(index, c)| Partition {
            index,
            files: c.to_vec(),
        })
        .collect()
}
