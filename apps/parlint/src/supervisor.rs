//! Worker process supervision.
//!
//! One OS process per partition, all spawned up front. Each worker gets its
//! `Dispatch` on stdin from a feeder thread and answers with a single
//! `WorkerOutcome` on stdout. A pump thread per worker drains stdout into a
//! channel so the supervisor can react to whichever worker finishes first.
//!
//! Any worker exiting non-zero is fatal for the whole run. Before returning
//! that error the supervisor kills and reaps every worker still running.

use crate::config::Options;
use crate::error::WorkerError;
use crate::models::message::{Dispatch, WorkerOutcome};
use crate::models::Report;
use crate::partition::Partition;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;

/// Hidden CLI flag that puts the binary into worker mode.
pub const WORKER_FLAG: &str = "--worker";

#[derive(Debug, Clone)]
/// How to start a worker process.
pub struct WorkerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Re-run the current executable in worker mode.
    pub fn current_exe() -> Result<Self, WorkerError> {
        let exe = std::env::current_exe().map_err(WorkerError::Executable)?;
        Ok(Self::new(exe, &[WORKER_FLAG]))
    }
}

pub struct WorkerSupervisor {
    command: WorkerCommand,
}

impl WorkerSupervisor {
    pub fn new(command: WorkerCommand) -> Self {
        Self { command }
    }

    /// Run every partition in its own worker and collect the reports in
    /// partition order.
    ///
    /// `on_report` is called as each worker succeeds, in completion order.
    pub fn dispatch_all<F>(
        &self,
        partitions: &[Partition],
        options: &Options,
        mut on_report: F,
    ) -> Result<Vec<Report>, WorkerError>
    where
        F: FnMut(&Report),
    {
        let (tx, rx) = mpsc::channel::<(usize, io::Result<Vec<u8>>)>();
        let mut children: Vec<Option<Child>> = Vec::with_capacity(partitions.len());

        for (slot, part) in partitions.iter().enumerate() {
            match self.spawn(part, options) {
                Ok(mut child) => {
                    if let Some(stdout) = child.stdout.take() {
                        pump(slot, stdout, tx.clone());
                    }
                    children.push(Some(child));
                }
                Err(err) => {
                    terminate(&mut children);
                    return Err(err);
                }
            }
        }
        drop(tx);
        tracing::debug!(workers = children.len(), "dispatched partitions");

        let mut reports: Vec<Option<Report>> = vec![None; partitions.len()];
        for _ in 0..partitions.len() {
            let Ok((slot, read)) = rx.recv() else {
                terminate(&mut children);
                return Err(WorkerError::Disconnected);
            };
            let index = partitions[slot].index;
            let result = match children[slot].take() {
                Some(child) => collect(index, child, read),
                None => Err(WorkerError::Disconnected),
            };
            match result {
                Ok(report) => {
                    tracing::debug!(
                        worker = index,
                        errors = report.error_count,
                        warnings = report.warning_count,
                        "worker finished"
                    );
                    on_report(&report);
                    reports[slot] = Some(report);
                }
                Err(err) => {
                    tracing::error!(worker = index, "{}", err);
                    terminate(&mut children);
                    return Err(err);
                }
            }
        }
        Ok(reports.into_iter().flatten().collect())
    }

    fn spawn(&self, part: &Partition, options: &Options) -> Result<Child, WorkerError> {
        let msg = serde_json::to_vec(&Dispatch {
            options: options.clone(),
            files: part.files.clone(),
        })?;
        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| WorkerError::Spawn {
                index: part.index,
                source,
            })?;
        if let Some(stdin) = child.stdin.take() {
            feed(part.index, stdin, msg);
        }
        tracing::trace!(worker = part.index, files = part.files.len(), "spawned worker");
        Ok(child)
    }
}

/// Write a dispatch on its own thread so a worker that is slow to read never
/// holds up spawning the others. Closing stdin marks the end of the dispatch.
fn feed(index: usize, mut stdin: ChildStdin, msg: Vec<u8>) {
    thread::spawn(move || {
        // A worker that dies before reading shows up through its exit code.
        if let Err(e) = stdin.write_all(&msg) {
            tracing::debug!(worker = index, "dispatch not delivered: {}", e);
        }
    });
}

/// Drain a worker's stdout on its own thread and hand the bytes back.
fn pump(slot: usize, mut stdout: ChildStdout, tx: mpsc::Sender<(usize, io::Result<Vec<u8>>)>) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let res = stdout.read_to_end(&mut buf).map(|_| buf);
        // receiver is gone once the supervisor bailed out
        let _ = tx.send((slot, res));
    });
}

/// Reap a finished worker and turn its output into a report.
fn collect(index: usize, mut child: Child, read: io::Result<Vec<u8>>) -> Result<Report, WorkerError> {
    let status = child
        .wait()
        .map_err(|source| WorkerError::Read { index, source })?;
    let bytes = read.map_err(|source| WorkerError::Read { index, source })?;
    interpret(index, status, &bytes)
}

fn interpret(index: usize, status: ExitStatus, bytes: &[u8]) -> Result<Report, WorkerError> {
    let outcome = serde_json::from_slice::<WorkerOutcome>(bytes);
    if !status.success() {
        let reason = match outcome {
            Ok(WorkerOutcome::Fatal { reason }) => reason,
            _ => "worker exited without a result".to_string(),
        };
        return Err(WorkerError::Exited {
            index,
            code: status.code(),
            reason,
        });
    }
    match outcome {
        Ok(WorkerOutcome::Report(report)) if report.is_consistent() => Ok(report),
        Ok(WorkerOutcome::Report(_)) => Err(WorkerError::Protocol {
            index,
            reason: "report totals do not match its diagnostics".into(),
        }),
        Ok(WorkerOutcome::Fatal { reason }) => Err(WorkerError::Protocol {
            index,
            reason: format!("fatal outcome with exit code 0: {}", reason),
        }),
        Err(e) => Err(WorkerError::Protocol {
            index,
            reason: format!("unreadable result: {}", e),
        }),
    }
}

/// Kill and reap every worker still running.
fn terminate(children: &mut [Option<Child>]) {
    for mut child in children.iter_mut().filter_map(Option::take) {
        let pid = child.id();
        if let Err(e) = child.kill() {
            tracing::debug!(pid, "kill failed: {}", e);
        }
        match child.wait() {
            Ok(status) => tracing::debug!(pid, %status, "terminated worker"),
            Err(e) => tracing::warn!(pid, "cannot reap worker: {}", e),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::models::fixtures::file;
    use std::time::{Duration, Instant};

    fn part(index: usize, files: &[&str]) -> Partition {
        Partition {
            index,
            files: files.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// A stand-in worker: `sh -c <script>`.
    fn sh(script: &str) -> WorkerSupervisor {
        WorkerSupervisor::new(WorkerCommand::new("sh", &["-c", script]))
    }

    fn ok_json(report: &Report) -> String {
        serde_json::to_string(&WorkerOutcome::Report(report.clone())).unwrap()
    }

    /// Report one warning against a file named after the worker's partition.
    const NAMED_REPORT: &str = r#"printf '{"status":"report","body":{"errorCount":0,"warningCount":1,"results":[{"filePath":"%s","messages":[{"severity":"warning","line":1,"column":1,"message":"m"}]}]}}' "$name""#;

    #[test]
    fn test_collects_reports_in_partition_order() {
        // later partitions finish first
        let script = format!(
            "read -r msg; case \"$msg\" in *p0.js*) sleep 0.8; name=p0;; *p1.js*) sleep 0.4; name=p1;; *) name=p2;; esac; {}",
            NAMED_REPORT
        );
        let parts = vec![part(0, &["p0.js"]), part(1, &["p1.js"]), part(2, &["p2.js"])];
        let mut completed = Vec::new();
        let reports = sh(&script)
            .dispatch_all(&parts, &Options::default(), |r| {
                completed.push(r.results[0].file_path.clone())
            })
            .unwrap();
        assert_eq!(completed, vec!["p2", "p1", "p0"]);
        let order: Vec<_> = reports.iter().map(|r| r.results[0].file_path.as_str()).collect();
        assert_eq!(order, vec!["p0", "p1", "p2"]);
    }

    #[test]
    fn test_slow_reader_does_not_delay_other_workers() {
        // The first partition's dispatch is far larger than a pipe buffer and
        // its worker stops reading partway, so writing it can never finish.
        // The second worker fails at once and must still be seen promptly.
        let big: Vec<String> = (0..10_000)
            .map(|i| format!("src/components/generated/module_{:05}.js", i))
            .collect();
        let big: Vec<&str> = big.iter().map(String::as_str).collect();
        let parts = vec![part(0, &big), part(1, &["small.js"])];
        let script =
            r#"n=$(head -c 70000 | wc -c | tr -d ' '); if [ "$n" -lt 70000 ]; then exit 1; fi; exec sleep 60"#;
        let start = Instant::now();
        let err = sh(script)
            .dispatch_all(&parts, &Options::default(), |_| {})
            .unwrap_err();
        assert!(matches!(err, WorkerError::Exited { index: 1, .. }));
        assert!(start.elapsed() < Duration::from_secs(30));
    }

    #[test]
    fn test_worker_receives_files_and_options() {
        // echo the dispatch back as the file path of a clean report
        let script = r#"read -r msg; case "$msg" in *'"quiet":true'*'"files":["x.js","y.js"]'*) f=ok;; *) f=bad;; esac; printf '{"status":"report","body":{"errorCount":0,"warningCount":0,"results":[{"filePath":"%s","messages":[]}]}}' "$f""#;
        let opts = Options {
            quiet: true,
            ..Options::default()
        };
        let reports = sh(script)
            .dispatch_all(&[part(0, &["x.js", "y.js"])], &opts, |_| {})
            .unwrap();
        assert_eq!(reports[0].results[0].file_path, "ok");
    }

    #[test]
    fn test_nonzero_exit_is_fatal_even_with_output() {
        let rep = Report::new(vec![file("a.js", 0, 0)]);
        let script = format!("cat >/dev/null; printf '%s' '{}'; exit 3", ok_json(&rep));
        let err = sh(&script)
            .dispatch_all(&[part(0, &["a.js"])], &Options::default(), |_| {})
            .unwrap_err();
        assert!(matches!(err, WorkerError::Exited { code: Some(3), .. }));
    }

    #[test]
    fn test_fatal_outcome_reason_is_reported() {
        let script =
            r#"cat >/dev/null; printf '{"status":"fatal","body":{"reason":"engine crashed"}}'; exit 1"#;
        let err = sh(script)
            .dispatch_all(&[part(0, &["a.js"])], &Options::default(), |_| {})
            .unwrap_err();
        match err {
            WorkerError::Exited { reason, .. } => assert_eq!(reason, "engine crashed"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_one_failure_kills_the_rest() {
        // partition 1 fails fast; the others would hang for a minute
        let script = r#"read -r msg; case "$msg" in *bad.js*) exit 2;; esac; exec sleep 60"#;
        let parts = vec![part(0, &["a.js"]), part(1, &["bad.js"]), part(2, &["c.js"])];
        let start = Instant::now();
        let err = sh(script)
            .dispatch_all(&parts, &Options::default(), |_| {})
            .unwrap_err();
        assert!(matches!(err, WorkerError::Exited { index: 1, .. }));
        assert!(start.elapsed() < Duration::from_secs(30));
    }

    #[test]
    fn test_success_without_result_is_protocol_error() {
        let err = sh("cat >/dev/null; echo not-json")
            .dispatch_all(&[part(0, &["a.js"])], &Options::default(), |_| {})
            .unwrap_err();
        assert!(matches!(err, WorkerError::Protocol { .. }));
    }

    #[test]
    fn test_inconsistent_totals_rejected() {
        let script = r#"cat >/dev/null; printf '{"status":"report","body":{"errorCount":4,"warningCount":0,"results":[]}}'"#;
        let err = sh(script)
            .dispatch_all(&[part(0, &["a.js"])], &Options::default(), |_| {})
            .unwrap_err();
        assert!(matches!(err, WorkerError::Protocol { .. }));
    }

    #[test]
    fn test_missing_program_fails_to_spawn() {
        let sup = WorkerSupervisor::new(WorkerCommand::new("/nonexistent/parlint-worker", &[]));
        let err = sup
            .dispatch_all(&[part(0, &["a.js"])], &Options::default(), |_| {})
            .unwrap_err();
        assert!(matches!(err, WorkerError::Spawn { index: 0, .. }));
    }

    #[test]
    fn test_no_partitions_is_empty() {
        let reports = sh("exit 1")
            .dispatch_all(&[], &Options::default(), |_| {})
            .unwrap();
        assert!(reports.is_empty());
    }
}
