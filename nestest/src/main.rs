//! Command-line front end for the nested test engine.
//!
//! Runs the built-in demo tree or the engine's self-check suite and maps the
//! outcome to a stable exit code.

use std::io::{self, Write};
use std::panic;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use nestest::demo::{DemoOptions, run_demo, selfcheck};
use nestest::io::config::{DEFAULT_CONFIG_FILE, load_config};
use nestest::{EngineError, RunReport, TracingReporter, exit_codes, logging};

#[derive(Parser)]
#[command(name = "nestest", version, about = "Nested test execution engine")]
struct Cli {
    /// Engine configuration file (TOML). Defaults apply when it is missing.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the Parent/Child demo tree, printing each test body as it starts.
    Demo {
        /// Make "Grandchild 2" fail an expectation.
        #[arg(long)]
        fail: bool,
        /// Declare "Child 2" twice to trigger the duplicate-name usage error.
        #[arg(long)]
        duplicate: bool,
        /// Print the run report as JSON after the trace.
        #[arg(long)]
        json: bool,
    },
    /// Check the engine against its documented guarantees.
    Selfcheck,
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            match err.downcast_ref::<EngineError>() {
                Some(EngineError::Usage(_)) => exit_codes::USAGE,
                _ => exit_codes::INVALID,
            }
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    debug!(config = ?config, "configuration loaded");

    match cli.command {
        Command::Demo {
            fail,
            duplicate,
            json,
        } => cmd_demo(
            &config,
            DemoOptions {
                fail_leaf: fail,
                duplicate_child: duplicate,
            },
            json,
        ),
        Command::Selfcheck => cmd_selfcheck(&config),
    }
}

fn cmd_demo(config: &nestest::EngineConfig, options: DemoOptions, json: bool) -> Result<i32> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let report = run_demo(&mut out, options, config)?;

    print_failures(&mut out, &report)?;
    if json {
        let payload = serde_json::to_string_pretty(&report).context("serialize run report")?;
        writeln!(out, "{payload}").context("write run report")?;
    }

    Ok(if report.is_success() {
        exit_codes::OK
    } else {
        exit_codes::FAILED
    })
}

fn cmd_selfcheck(config: &nestest::EngineConfig) -> Result<i32> {
    // Expectation checks panic on purpose; keep stderr for real diagnostics.
    panic::set_hook(Box::new(|info| debug!(%info, "panic captured")));

    let checks = selfcheck(config, &TracingReporter);
    let _ = panic::take_hook();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failed = 0;
    for check in &checks {
        match &check.outcome {
            Ok(()) => writeln!(out, "ok   {}", check.name)?,
            Err(detail) => {
                failed += 1;
                writeln!(out, "FAIL {}: {}", check.name, detail)?;
            }
        }
    }
    writeln!(out, "{} checks, {} failed", checks.len(), failed)?;

    Ok(if failed == 0 {
        exit_codes::OK
    } else {
        exit_codes::FAILED
    })
}

fn print_failures(out: &mut dyn Write, report: &RunReport) -> Result<()> {
    for record in &report.failures {
        writeln!(
            out,
            "{} failed on pass {}: {}",
            record.path, record.pass, record.failure
        )
        .context("write failure summary")?;
    }
    Ok(())
}
