//! Parlint CLI binary entry point.
//! Runs as the coordinator, or as a worker when started with `--worker`.

use anyhow::Result;
use clap::Parser;
use parlint::cli::{self, Cli};
use parlint::config;
use parlint::engine::BuiltinEngine;
use parlint::linter::Linter;
use parlint::output;
use parlint::worker::{fail_worker, run_worker};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PARLINT_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Lint the requested patterns and report whether any problem was found.
fn run(cli: &Cli) -> Result<bool> {
    let opts = config::resolve_options(
        cli.overrides()?,
        cli.config.as_deref(),
        !cli.no_config_lookup,
        None,
    )?;
    let linter = Linter::new(opts, BuiltinEngine::new()?);
    let report = linter.execute(&cli.patterns, output::print_results)?;
    if report.has_problems() {
        output::print_total(&report);
        return Ok(true);
    }
    Ok(false)
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // help goes to stdout with code 0; usage errors exit 1 like any failure
            let ok = e.exit_code() == 0;
            if let Err(io) = e.print() {
                eprintln!("{} {}", output::error_prefix(), io);
            }
            return if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE };
        }
    };
    init_tracing();

    if cli.version {
        println!("{}", cli::version_line());
        return ExitCode::SUCCESS;
    }

    if cli.worker {
        let stdout = std::io::stdout().lock();
        let outcome = match BuiltinEngine::new() {
            Ok(engine) => run_worker(engine, std::io::stdin().lock(), stdout),
            Err(e) => fail_worker(e.to_string(), stdout),
        };
        return ExitCode::from(outcome.exit_code());
    }

    match run(&cli) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {:#}", output::error_prefix(), e);
            ExitCode::FAILURE
        }
    }
}
