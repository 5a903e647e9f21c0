//! Built-in test trees used by the `nestest` binary.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{Context, Result, bail, ensure};

use crate::core::types::RunReport;
use crate::driver::{Runner, test};
use crate::expect::{expect_panics, expect_panics_with};
use crate::failure::{EngineError, Failure, TestResult};
use crate::io::config::EngineConfig;
use crate::io::report::Reporter;
use crate::{expect_eq, expect_ne};

/// Switches that make the demo tree misbehave on purpose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemoOptions {
    /// "Grandchild 2" fails an expectation.
    pub fail_leaf: bool,
    /// "Child 2" is declared twice during the first pass.
    pub duplicate_child: bool,
}

/// The two-level family tree: two children with two grandchildren each.
///
/// `visit` is called with the test's name on every body entry.
pub fn family_tree<'a>(visit: &'a dyn Fn(&str) -> TestResult, options: DemoOptions) -> Runner<'a> {
    test("Parent", move |t| {
        visit("Parent")?;
        t.test("Child 1", |t| {
            visit("Child 1")?;
            t.test("Grandchild 1", |_| visit("Grandchild 1"))?;
            t.test("Grandchild 2", |_| {
                visit("Grandchild 2")?;
                if options.fail_leaf {
                    expect_eq!(2 + 2, 5);
                }
                Ok(())
            })
        })?;
        t.test("Child 2", |t| {
            visit("Child 2")?;
            t.test("Grandchild 3", |_| visit("Grandchild 3"))?;
            t.test("Grandchild 4", |_| visit("Grandchild 4"))
        })?;
        if options.duplicate_child {
            t.test("Child 2", |_| Ok(()))?;
        }
        Ok(())
    })
}

/// Run the family tree, writing each body entry to `out` on its own line.
pub fn run_demo(
    out: &mut dyn Write,
    options: DemoOptions,
    config: &EngineConfig,
) -> Result<RunReport, EngineError> {
    let out = RefCell::new(out);
    let visit = |name: &str| -> TestResult {
        let mut out = out.borrow_mut();
        writeln!(out, "{name}").context("write demo trace")?;
        Ok(())
    };
    let mut runner = family_tree(&visit, options).with_config(config.clone());
    runner.run()
}

/// Outcome of one self-check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: &'static str,
    pub outcome: Result<(), String>,
}

/// Run the engine against its own documented guarantees.
///
/// Failures raised inside the checked trees go to `reporter`.
pub fn selfcheck(config: &EngineConfig, reporter: &dyn Reporter) -> Vec<Check> {
    vec![
        check("leaves run once, ancestors once per leaf", || {
            execution_counts(config, reporter)
        }),
        check("a failing leaf does not stop its siblings", || {
            failure_isolation(config, reporter)
        }),
        check("duplicate sibling names are rejected", || {
            duplicate_names(config, reporter)
        }),
        check("expectations describe what went wrong", || {
            expectations(config, reporter)
        }),
        check("running again reproduces the same run", || {
            rerun(config, reporter)
        }),
    ]
}

fn check(name: &'static str, f: impl FnOnce() -> Result<()>) -> Check {
    Check {
        name,
        outcome: f().map_err(|err| format!("{err:#}")),
    }
}

fn counting_run(
    config: &EngineConfig,
    reporter: &dyn Reporter,
    options: DemoOptions,
) -> Result<(RunReport, BTreeMap<String, u32>)> {
    let counts = RefCell::new(BTreeMap::new());
    let visit = |name: &str| -> TestResult {
        *counts.borrow_mut().entry(name.to_string()).or_insert(0) += 1;
        Ok(())
    };
    let report = family_tree(&visit, options)
        .with_config(config.clone())
        .with_reporter(reporter)
        .run()?;
    Ok((report, counts.into_inner()))
}

fn execution_counts(config: &EngineConfig, reporter: &dyn Reporter) -> Result<()> {
    let (report, counts) = counting_run(config, reporter, DemoOptions::default())?;
    let expected = [
        ("Parent", 4),
        ("Child 1", 2),
        ("Child 2", 2),
        ("Grandchild 1", 1),
        ("Grandchild 2", 1),
        ("Grandchild 3", 1),
        ("Grandchild 4", 1),
    ];
    for (name, runs) in expected {
        let actual = counts.get(name).copied().unwrap_or(0);
        ensure!(actual == runs, "{name} ran {actual} times, expected {runs}");
    }
    ensure!(report.passes == 4, "expected 4 passes, got {}", report.passes);
    ensure!(report.is_success(), "unexpected failures: {:?}", report.failures);
    Ok(())
}

fn failure_isolation(config: &EngineConfig, reporter: &dyn Reporter) -> Result<()> {
    let options = DemoOptions {
        fail_leaf: true,
        ..DemoOptions::default()
    };
    let (report, counts) = counting_run(config, reporter, options)?;
    ensure!(
        report.failures.len() == 1,
        "expected one failure, got {}",
        report.failures.len()
    );
    ensure!(
        report.failures[0].path == "Parent/Child 1/Grandchild 2",
        "failure recorded at {}",
        report.failures[0].path
    );
    for name in ["Grandchild 1", "Grandchild 3", "Grandchild 4"] {
        ensure!(counts.get(name) == Some(&1), "{name} did not run exactly once");
    }
    Ok(())
}

fn duplicate_names(config: &EngineConfig, reporter: &dyn Reporter) -> Result<()> {
    let options = DemoOptions {
        duplicate_child: true,
        ..DemoOptions::default()
    };
    match counting_run(config, reporter, options) {
        Ok(_) => bail!("duplicate declaration was accepted"),
        Err(err) => match err.downcast_ref::<EngineError>() {
            Some(EngineError::Usage(_)) => Ok(()),
            _ => Err(err.context("expected a usage error")),
        },
    }
}

fn expectations(config: &EngineConfig, reporter: &dyn Reporter) -> Result<()> {
    let mut runner = test("expect", |t| {
        t.test("expect_eq reports both values", |_| {
            let inner = || -> TestResult {
                expect_eq!(1, 2);
                Ok(())
            };
            match inner() {
                Err(Failure::Assertion(assertion)) => {
                    expect_eq!(assertion.expression, "1 == 2");
                    expect_eq!(assertion.actual, "1 != 2");
                    Ok(())
                }
                other => Err(Failure::unrecognized(format!("unexpected {other:?}"))),
            }
        })?;
        t.test("expect_panics catches a panic", |_| {
            expect_panics(|| panic!("expected panic"))
        })?;
        t.test("expect_panics_with rejects the wrong payload", |_| {
            match expect_panics_with::<String, _>(|| std::panic::panic_any(0_i32)) {
                Err(Failure::Assertion(assertion)) => {
                    expect_eq!(assertion.actual, "unknown");
                    Ok(())
                }
                other => Err(Failure::unrecognized(format!("unexpected {other:?}"))),
            }
        })?;
        t.test("expect_ne passes on different values", |_| {
            expect_ne!(1, 2);
            Ok(())
        })
    })
    .with_config(config.clone())
    .with_reporter(reporter);

    let report = runner.run()?;
    ensure!(report.passes == 4, "expected 4 passes, got {}", report.passes);
    ensure!(report.is_success(), "unexpected failures: {:?}", report.failures);
    Ok(())
}

fn rerun(config: &EngineConfig, reporter: &dyn Reporter) -> Result<()> {
    let visit = |_: &str| -> TestResult { Ok(()) };
    let mut runner = family_tree(&visit, DemoOptions::default())
        .with_config(config.clone())
        .with_reporter(reporter);
    let first = runner.run()?;
    let second = runner.run()?;
    ensure!(first == second, "second run differed: {first:?} vs {second:?}");
    Ok(())
}
