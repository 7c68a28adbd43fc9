//! Top-level orchestration: resolve, decide, dispatch, aggregate.

use crate::aggregate;
use crate::config::Options;
use crate::engine::AnalysisEngine;
use crate::error::{EngineError, LintError};
use crate::models::Report;
use crate::partition::{self, Distribution};
use crate::resolve;
use crate::supervisor::{WorkerCommand, WorkerSupervisor};

pub struct Linter<E> {
    options: Options,
    engine: E,
    cpus: usize,
    worker: Option<WorkerCommand>,
}

impl<E: AnalysisEngine> Linter<E> {
    pub fn new(options: Options, engine: E) -> Self {
        Self {
            options,
            engine,
            cpus: num_cpus::get(),
            worker: None,
        }
    }

    /// Override the detected logical processor count.
    pub fn with_cpus(mut self, cpus: usize) -> Self {
        self.cpus = cpus;
        self
    }

    /// Override how workers are started (defaults to this executable).
    pub fn with_worker(mut self, command: WorkerCommand) -> Self {
        self.worker = Some(command);
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Lint `files` in this process, applying fixes and quiet filtering.
    pub fn run(&self, files: &[String]) -> Result<Report, EngineError> {
        let report = self.engine.analyze(files, &self.options)?;
        if self.options.fix {
            self.engine.output_fixes(&report, &self.options)?;
        }
        if self.options.quiet {
            return Ok(report.into_errors_only());
        }
        Ok(report)
    }

    /// Lint everything `patterns` resolve to and return the aggregate.
    ///
    /// `emit` receives each report carrying problems as soon as it exists:
    /// the single report, or each worker's partial report in completion
    /// order. Any worker failure fails the whole call.
    pub fn execute<F>(&self, patterns: &[String], mut emit: F) -> Result<Report, LintError>
    where
        F: FnMut(&Report),
    {
        let files = resolve::resolve_files(patterns, &self.options);
        tracing::debug!(files = files.len(), cpus = self.cpus, "resolved file set");

        match partition::decide(&files, &self.options, self.cpus) {
            Distribution::Single => {
                let report = self.run(&files)?;
                if report.has_problems() {
                    emit(&report);
                }
                Ok(report)
            }
            Distribution::Distributed(parts) => {
                tracing::info!(
                    files = files.len(),
                    workers = parts.len(),
                    "distributing lint across worker processes"
                );
                let command = match &self.worker {
                    Some(c) => c.clone(),
                    None => WorkerCommand::current_exe()?,
                };
                let partials = WorkerSupervisor::new(command).dispatch_all(
                    &parts,
                    &self.options,
                    |report| {
                        if report.has_problems() {
                            emit(report);
                        }
                    },
                )?;
                Ok(aggregate::merge(partials))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::file;
    use crate::models::{Diagnostic, FileReport, Severity};
    use crate::partition::split;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::tempdir;

    /// Deterministic engine: problems depend only on the file name.
    #[derive(Default)]
    struct Fake {
        fixed: RefCell<usize>,
    }

    fn problems_for(path: &str) -> FileReport {
        let n: usize = path
            .trim_start_matches("f")
            .trim_end_matches(".js")
            .parse()
            .unwrap_or(0);
        let mut msgs = Vec::new();
        if n % 3 == 0 {
            msgs.push(crate::models::fixtures::diag(Severity::Error, "no-debugger"));
        }
        if n % 4 == 0 {
            msgs.push(crate::models::fixtures::diag(Severity::Warning, "eol-last"));
        }
        FileReport::new(path, msgs)
    }

    impl AnalysisEngine for Fake {
        fn analyze(&self, files: &[String], _: &Options) -> Result<Report, EngineError> {
            Ok(Report::new(files.iter().map(|f| problems_for(f)).collect()))
        }

        fn output_fixes(&self, _: &Report, _: &Options) -> Result<(), EngineError> {
            *self.fixed.borrow_mut() += 1;
            Ok(())
        }
    }

    struct Canned(Report);

    impl AnalysisEngine for Canned {
        fn analyze(&self, _: &[String], _: &Options) -> Result<Report, EngineError> {
            Ok(self.0.clone())
        }

        fn output_fixes(&self, _: &Report, _: &Options) -> Result<(), EngineError> {
            Ok(())
        }
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{}.js", i)).collect()
    }

    fn workspace(n: usize) -> (tempfile::TempDir, Options) {
        let dir = tempdir().unwrap();
        for f in names(n) {
            fs::write(dir.path().join(f), "x;\n").unwrap();
        }
        let opts = Options {
            cwd: Some(dir.path().to_path_buf()),
            ..Options::default()
        };
        (dir, opts)
    }

    #[test]
    fn test_quiet_keeps_only_files_with_errors() {
        let rep = Report::new(vec![
            file("a.js", 1, 0),
            file("b.js", 0, 1),
            file("c.js", 0, 0),
        ]);
        let opts = Options {
            quiet: true,
            ..Options::default()
        };
        let out = Linter::new(opts, Canned(rep)).run(&[]).unwrap();
        assert_eq!(out.results.len(), 1);
        assert_eq!(out.results[0].file_path, "a.js");
    }

    #[test]
    fn test_fix_only_outputs_when_enabled() {
        let engine = Fake::default();
        let linter = Linter::new(Options::default(), engine);
        linter.run(&names(3)).unwrap();
        assert_eq!(*linter.engine.fixed.borrow(), 0);

        let opts = Options {
            fix: true,
            ..Options::default()
        };
        let linter = Linter::new(opts, Fake::default());
        linter.run(&names(3)).unwrap();
        assert_eq!(*linter.engine.fixed.borrow(), 1);
    }

    #[test]
    fn test_partitioning_is_lossless_for_totals() {
        let files = names(120);
        let linter = Linter::new(Options::default(), Fake::default());
        let single = linter.run(&files).unwrap();
        let parts = split(&files, 4);
        assert_eq!(parts.len(), 4);
        let merged =
            aggregate::merge(parts.iter().map(|p| linter.run(&p.files).unwrap()));
        assert_eq!(merged.error_count, single.error_count);
        assert_eq!(merged.warning_count, single.warning_count);
        assert_eq!(merged, single);
    }

    #[test]
    fn test_execute_single_emits_once_when_problems() {
        let (_dir, opts) = workspace(5);
        let linter = Linter::new(opts, Fake::default()).with_cpus(8);
        let mut emitted = Vec::new();
        let rep = linter
            .execute(&["*.js".to_string()], |r| emitted.push(r.clone()))
            .unwrap();
        // f0 and f3 error, f0 and f4 warn
        assert_eq!((rep.error_count, rep.warning_count), (2, 2));
        assert_eq!(emitted, vec![rep]);
    }

    #[test]
    fn test_execute_with_no_files_is_clean_and_silent() {
        let (_dir, opts) = workspace(0);
        let linter = Linter::new(opts, Fake::default());
        let mut emitted = 0;
        let rep = linter
            .execute(&["src/**/*.js".to_string()], |_| emitted += 1)
            .unwrap();
        assert_eq!(rep, Report::default());
        assert_eq!(emitted, 0);
    }

    #[test]
    fn test_clean_run_emits_nothing() {
        let (_dir, opts) = workspace(3);
        let clean = Canned(Report::new(vec![FileReport::new("f1.js", Vec::<Diagnostic>::new())]));
        let mut emitted = 0;
        let rep = Linter::new(opts, clean)
            .execute(&[".".to_string()], |_| emitted += 1)
            .unwrap();
        assert!(!rep.has_problems());
        assert_eq!(emitted, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_distributed_merges_in_partition_order() {
        let (_dir, opts) = workspace(60);
        // 60 sorted names over 4 workers: f0.js opens partition 0, f22.js
        // partition 1, f36.js partition 2. Later partitions answer first.
        let script = r#"read -r msg; case "$msg" in *'"f0.js"'*) sleep 0.9; name=p0;; *'"f22.js"'*) sleep 0.6; name=p1;; *'"f36.js"'*) sleep 0.3; name=p2;; *) name=p3;; esac; printf '{"status":"report","body":{"errorCount":0,"warningCount":1,"results":[{"filePath":"%s","messages":[{"severity":"warning","line":1,"column":1,"message":"m"}]}]}}' "$name""#;
        let linter = Linter::new(opts, Fake::default())
            .with_cpus(4)
            .with_worker(WorkerCommand::new("sh", &["-c", script]));
        let mut emitted = Vec::new();
        let rep = linter
            .execute(&["*.js".to_string()], |r| {
                emitted.push(r.results[0].file_path.clone())
            })
            .unwrap();
        assert_eq!(emitted, vec!["p3", "p2", "p1", "p0"]);
        assert_eq!((rep.error_count, rep.warning_count), (0, 4));
        let order: Vec<_> = rep.results.iter().map(|r| r.file_path.as_str()).collect();
        assert_eq!(order, vec!["p0", "p1", "p2", "p3"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_single_worker_failure_fails_execute() {
        let (_dir, opts) = workspace(60);
        let clean = serde_json::to_string(&crate::models::message::WorkerOutcome::Report(
            Report::default(),
        ))
        .unwrap();
        // the partition holding f59.js crashes
        let script = format!(
            "read -r msg; case \"$msg\" in *f59.js*) exit 1;; esac; printf '%s' '{}'",
            clean
        );
        let linter = Linter::new(opts, Fake::default())
            .with_cpus(4)
            .with_worker(WorkerCommand::new("sh", &["-c", &script]));
        let err = linter.execute(&["*.js".to_string()], |_| {}).unwrap_err();
        assert!(matches!(
            err,
            LintError::Worker(crate::error::WorkerError::Exited { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_cache_artifact_keeps_work_in_process() {
        let (dir, opts) = workspace(60);
        fs::write(dir.path().join(".eslintcache"), "").unwrap();
        // a worker would fail; the cache must keep us from spawning one
        let linter = Linter::new(opts, Fake::default())
            .with_cpus(4)
            .with_worker(WorkerCommand::new("sh", &["-c", "exit 1"]));
        let rep = linter.execute(&["*.js".to_string()], |_| {}).unwrap();
        assert_eq!(rep.results.len(), 60);
    }
}
