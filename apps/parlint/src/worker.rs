//! Worker entry point.
//!
//! Reads one `Dispatch`, lints exactly its files with the dispatched options,
//! and writes one `WorkerOutcome`. The caller exits with
//! [`WorkerOutcome::exit_code`].

use crate::engine::AnalysisEngine;
use crate::linter::Linter;
use crate::models::message::{Dispatch, WorkerOutcome};
use std::io::{Read, Write};

pub fn run_worker<E, R, W>(engine: E, mut input: R, output: W) -> WorkerOutcome
where
    E: AnalysisEngine,
    R: Read,
    W: Write,
{
    let mut raw = Vec::new();
    let outcome = match input.read_to_end(&mut raw) {
        Err(e) => WorkerOutcome::Fatal {
            reason: format!("cannot read dispatch: {}", e),
        },
        Ok(_) => match serde_json::from_slice::<Dispatch>(&raw) {
            Err(e) => WorkerOutcome::Fatal {
                reason: format!("invalid dispatch: {}", e),
            },
            Ok(Dispatch { options, files }) => {
                tracing::debug!(files = files.len(), "worker started");
                match Linter::new(options, engine).run(&files) {
                    Ok(report) => WorkerOutcome::Report(report),
                    Err(e) => WorkerOutcome::Fatal {
                        reason: e.to_string(),
                    },
                }
            }
        },
    };

    send(outcome, output)
}

/// Report a worker that cannot start linting at all.
pub fn fail_worker<W: Write>(reason: String, output: W) -> WorkerOutcome {
    tracing::error!("worker cannot start: {}", reason);
    send(WorkerOutcome::Fatal { reason }, output)
}

/// Write `outcome` as the worker's only stdout document.
fn send<W: Write>(outcome: WorkerOutcome, mut output: W) -> WorkerOutcome {
    let written = serde_json::to_writer(&mut output, &outcome)
        .map_err(std::io::Error::from)
        .and_then(|_| output.flush());
    if let Err(e) = written {
        tracing::error!("cannot send worker result: {}", e);
        return WorkerOutcome::Fatal {
            reason: format!("cannot send result: {}", e),
        };
    }
    outcome
}
