//! Pattern expansion into the ordered, deduplicated file set.
//!
//! - An existing file is taken as given.
//! - A directory expands to `dir/**`.
//! - Anything else is a glob relative to the working directory.
//!
//! Ignore patterns (ignore file plus `ignore_pattern`) and the extension
//! filter only apply to expanded matches, never to explicitly named files.
//! A pattern that matches nothing simply contributes no files.

use crate::config::Options;
use glob::{glob_with, MatchOptions, Pattern};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Read ignore patterns from the ignore file and options.
///
/// A missing ignore file is treated as empty. Returns nothing when ignoring
/// is disabled.
pub fn ignore_patterns(options: &Options) -> Vec<String> {
    if !options.ignore {
        return Vec::new();
    }
    let mut out: Vec<String> = match fs::read_to_string(options.ignore_file()) {
        Ok(s) => s
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect(),
        Err(_) => Vec::new(),
    };
    out.extend(options.ignore_pattern.iter().cloned());
    out
}

fn compile_ignores(raw: &[String]) -> Vec<Pattern> {
    let mut out = Vec::new();
    for p in raw {
        let base = p.trim_start_matches("./").trim_end_matches('/');
        for candidate in [base.to_string(), format!("{}/**", base)] {
            match Pattern::new(&candidate) {
                Ok(pat) => out.push(pat),
                Err(e) => tracing::warn!(pattern = %p, "invalid ignore pattern: {}", e),
            }
        }
    }
    out
}

fn normalize(p: &str) -> String {
    let s = p.strip_prefix("./").unwrap_or(p);
    s.replace('\\', "/")
}

fn has_extension(path: &str, exts: &[String]) -> bool {
    if exts.is_empty() {
        return true;
    }
    let Some(ext) = Path::new(path).extension().and_then(|e| e.to_str()) else {
        return false;
    };
    exts.iter()
        .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext))
}

/// Expand `patterns` into the file set, in pattern order.
pub fn resolve_files(patterns: &[String], options: &Options) -> Vec<String> {
    let cwd = options.cwd();
    let ignores = compile_ignores(&ignore_patterns(options));
    let match_opts = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };

    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for raw in patterns {
        let cleaned = raw
            .trim_matches(|c| c == '\'' || c == '"')
            .trim_end_matches('/')
            .to_string();
        if cleaned.is_empty() {
            continue;
        }
        let full = if cleaned == "." {
            cwd.clone()
        } else {
            cwd.join(&cleaned)
        };
        let meta = fs::symlink_metadata(&full).ok();

        if meta.as_ref().is_some_and(|m| m.is_file()) {
            // keyed like glob matches so the same file never appears twice
            let rel = pathdiff::diff_paths(&full, &cwd).unwrap_or_else(|| full.clone());
            let key = normalize(&rel.to_string_lossy());
            if seen.insert(key.clone()) {
                files.push(key);
            }
            continue;
        }

        let glob_pat = if meta.as_ref().is_some_and(|m| m.is_dir()) {
            format!("{}/**/*", Pattern::escape(&full.to_string_lossy()))
        } else if Path::new(&cleaned).is_absolute() {
            cleaned.clone()
        } else {
            format!("{}/{}", Pattern::escape(&cwd.to_string_lossy()), cleaned)
        };
        let entries = match glob_with(&glob_pat, match_opts) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(pattern = %raw, "invalid pattern: {}", e);
                continue;
            }
        };
        let mut matched = Vec::new();
        for path in entries.flatten() {
            if !path.is_file() {
                continue;
            }
            let rel = pathdiff::diff_paths(&path, &cwd).unwrap_or(path);
            let rel_str = normalize(&rel.to_string_lossy());
            if ignores.iter().any(|p| p.matches_with(&rel_str, match_opts)) {
                continue;
            }
            if !has_extension(&rel_str, &options.extensions) {
                continue;
            }
            matched.push(rel_str);
        }
        if matched.is_empty() {
            tracing::debug!(pattern = %raw, "pattern resolved to no files");
        }
        matched.sort();
        for f in matched {
            if seen.insert(f.clone()) {
                files.push(f);
            }
        }
    }
    files
}
