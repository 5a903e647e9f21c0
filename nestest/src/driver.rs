//! The pass driver: re-runs the root until every declared test is exhausted.

use std::cell::RefCell;
use std::panic::Location;

use tracing::debug;

use crate::core::invariants::validate_invariants;
use crate::core::tree::{DeclSite, TestTree};
use crate::core::types::RunReport;
use crate::failure::{EngineError, TestResult};
use crate::io::config::EngineConfig;
use crate::io::report::{Reporter, TracingReporter};
use crate::scope::{RunState, Scope, execute};

thread_local! {
    /// Name of the root whose run is in flight on this thread.
    static ACTIVE_RUN: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Marks a run as in flight for as long as it is alive.
struct RunGuard;

impl RunGuard {
    fn acquire(root: &str) -> Result<Self, EngineError> {
        ACTIVE_RUN.with(|active| {
            let mut active = active.borrow_mut();
            if let Some(name) = active.as_ref() {
                return Err(EngineError::RunInFlight {
                    active: name.clone(),
                    requested: root.to_string(),
                });
            }
            *active = Some(root.to_string());
            Ok(RunGuard)
        })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        ACTIVE_RUN.with(|active| active.borrow_mut().take());
    }
}

type RootBody<'a> = Box<dyn FnMut(&mut Scope<'_>) -> TestResult + 'a>;

/// A declared root test. Calling [`Runner::run`] drives it to completion.
pub struct Runner<'a> {
    name: String,
    declared_at: DeclSite,
    body: RootBody<'a>,
    config: EngineConfig,
    reporter: Box<dyn Reporter + 'a>,
}

/// Declare a root test.
///
/// Nothing runs until [`Runner::run`] is called. Nested tests are declared
/// from inside `body` through the [`Scope`] it receives.
#[track_caller]
pub fn test<'a, F>(name: impl Into<String>, body: F) -> Runner<'a>
where
    F: FnMut(&mut Scope<'_>) -> TestResult + 'a,
{
    Runner {
        name: name.into(),
        declared_at: Location::caller(),
        body: Box::new(body),
        config: EngineConfig::default(),
        reporter: Box::new(TracingReporter),
    }
}

impl<'a> Runner<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_reporter<R: Reporter + 'a>(mut self, reporter: R) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// Run the whole tree from a clean state.
    ///
    /// Each pass invokes the root body once, and exactly one root-to-leaf path
    /// executes. Failures are reported and recorded per pass; only a usage
    /// error, the pass limit or an invariant violation end the run early.
    /// Calling `run` again repeats the whole run from scratch.
    pub fn run(&mut self) -> Result<RunReport, EngineError> {
        let _guard = RunGuard::acquire(&self.name)?;
        let mut run = RunState::new(TestTree::new(&self.name, self.declared_at));
        let root = run.tree.root();
        let mut failures = Vec::new();

        debug!(root = %self.name, "run started");
        while run.tree.is_eligible(root) {
            if run.pass >= self.config.max_passes {
                return Err(EngineError::MaxPassesExceeded {
                    root: self.name.clone(),
                    max_passes: self.config.max_passes,
                });
            }
            run.begin_pass();
            debug!(root = %self.name, pass = run.pass, "pass started");
            self.reporter.pass_started(&self.name, run.pass);

            let body = &mut self.body;
            if let Err(failure) = execute(&mut run, root, |scope| body(scope)) {
                debug!(root = %self.name, pass = run.pass, %failure, "pass ended with failure");
            }

            for record in run.take_failures() {
                self.reporter.failure(&record);
                failures.push(record);
            }
            if let Some(usage) = run.take_fatal() {
                return Err(usage.into());
            }

            run.tree.advance_after_pass();

            if self.config.check_invariants {
                let errors = validate_invariants(&run.tree);
                if !errors.is_empty() {
                    return Err(EngineError::InvariantViolation {
                        pass: run.pass,
                        errors: errors.join("; "),
                    });
                }
            }
        }

        let report = RunReport::new(&run.tree, run.pass, failures);
        self.reporter.run_finished(&report);
        Ok(report)
    }
}
