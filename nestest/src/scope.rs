//! Nested declarations and the per-node execute path.
//!
//! A [`Scope`] is handed to every body the engine runs. It names the node that
//! body belongs to, so a nested `scope.test(..)` call knows its parent without
//! any global "current test" pointer.

use std::panic::{self, AssertUnwindSafe, Location};

use tracing::{trace, warn};

use crate::core::path::node_path;
use crate::core::tree::{NodeId, Resolution, TestTree};
use crate::core::types::FailureRecord;
use crate::failure::{Failure, TestResult, UsageError};

/// Mutable state of one run, shared by every scope of that run.
pub(crate) struct RunState {
    pub(crate) tree: TestTree,
    /// 1-indexed number of the pass in progress; 0 before the first pass.
    pub(crate) pass: u32,
    /// Failures recorded during the current pass.
    failures: Vec<FailureRecord>,
    /// First usage error seen during the current pass.
    fatal: Option<UsageError>,
}

impl RunState {
    pub(crate) fn new(tree: TestTree) -> Self {
        Self {
            tree,
            pass: 0,
            failures: Vec::new(),
            fatal: None,
        }
    }

    pub(crate) fn begin_pass(&mut self) {
        self.pass += 1;
        self.failures.clear();
    }

    pub(crate) fn take_failures(&mut self) -> Vec<FailureRecord> {
        std::mem::take(&mut self.failures)
    }

    pub(crate) fn take_fatal(&mut self) -> Option<UsageError> {
        self.fatal.take()
    }

    fn record(&mut self, id: NodeId, failure: Failure) {
        self.failures.push(FailureRecord {
            pass: self.pass,
            path: node_path(&self.tree, id),
            failure,
        });
    }
}

/// Handle through which a running body declares nested tests.
pub struct Scope<'r> {
    run: &'r mut RunState,
    node: NodeId,
}

impl Scope<'_> {
    /// Declare a nested test and run it if this pass selected it.
    ///
    /// On the first pass through this scope the name is appended to the
    /// children; on later passes the known child is reused. The body runs only
    /// when the child sits under this node's cursor and still has work left;
    /// otherwise the call just registers the name and returns `Ok(())`.
    ///
    /// A failure inside `body` is recorded against the child and not returned:
    /// the caller keeps going, so siblings declared after a failing test are
    /// still registered on this pass. Declaring the same name twice during one
    /// execution of this scope's node returns [`Failure::Usage`], which aborts
    /// the whole run.
    ///
    /// A known name declared from a different call site keeps its place in the
    /// tree and its first recorded call site. When selected, the body handed
    /// in on this pass runs, since closures do not outlive their pass.
    #[track_caller]
    pub fn test<F>(&mut self, name: &str, body: F) -> TestResult
    where
        F: FnOnce(&mut Scope<'_>) -> TestResult,
    {
        let declared_at = Location::caller();
        let child = match self.run.tree.resolve_child(self.node, name, declared_at) {
            Ok(Resolution::Execute(child)) => child,
            Ok(Resolution::Registered(_)) => return Ok(()),
            Ok(Resolution::Redeclared {
                id,
                first_declared_at,
                selected,
            }) => {
                warn!(
                    path = %node_path(&self.run.tree, id),
                    first = %first_declared_at,
                    redeclared = %declared_at,
                    selected,
                    "test redeclared from a different call site"
                );
                if !selected {
                    return Ok(());
                }
                id
            }
            Err(usage) => {
                warn!(error = %usage, pass = self.run.pass, "malformed test tree");
                if self.run.fatal.is_none() {
                    self.run.fatal = Some(usage.clone());
                }
                return Err(Failure::Usage(usage));
            }
        };

        match execute(self.run, child, body) {
            Err(failure @ Failure::Usage(_)) => Err(failure),
            _ => Ok(()),
        }
    }

    /// Name of the test this scope belongs to.
    pub fn name(&self) -> &str {
        &self.run.tree.node(self.node).name
    }

    /// `/`-separated path from the root to this scope's test.
    pub fn path(&self) -> String {
        node_path(&self.run.tree, self.node)
    }

    /// 1-indexed number of the pass in progress.
    pub fn pass(&self) -> u32 {
        self.run.pass
    }
}

/// Run one node's body and do the bookkeeping that must survive a failure.
///
/// Panics are converted into [`Failure`] at the innermost node. Any failure
/// other than a usage error is recorded against `id`; usage errors are only
/// passed back up so the driver can abort.
pub(crate) fn execute<F>(run: &mut RunState, id: NodeId, body: F) -> TestResult
where
    F: FnOnce(&mut Scope<'_>) -> TestResult,
{
    run.tree.begin(id);
    trace!(pass = run.pass, path = %node_path(&run.tree, id), "running test body");

    let caught = {
        let mut scope = Scope {
            run: &mut *run,
            node: id,
        };
        panic::catch_unwind(AssertUnwindSafe(|| body(&mut scope)))
    };
    let outcome = caught.unwrap_or_else(|payload| Err(Failure::from_panic(payload)));

    match &outcome {
        Ok(()) | Err(Failure::Usage(_)) => {}
        Err(failure) => run.record(id, failure.clone()),
    }
    run.tree.finish(id);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expect;

    fn fresh_run() -> RunState {
        let mut run = RunState::new(TestTree::new("root", Location::caller()));
        run.begin_pass();
        run
    }

    #[test]
    fn selected_child_runs_and_unselected_sibling_only_registers() {
        let mut run = fresh_run();
        let root = run.tree.root();
        let mut ran = Vec::new();

        let outcome = execute(&mut run, root, |scope| {
            scope.test("first", |inner| {
                ran.push(inner.path());
                Ok(())
            })?;
            scope.test("second", |inner| {
                ran.push(inner.path());
                Ok(())
            })
        });

        assert_eq!(outcome, Ok(()));
        assert_eq!(ran, vec!["root/first".to_string()]);
        assert_eq!(run.tree.node(root).children.len(), 2);
        assert!(run.take_failures().is_empty());
    }

    #[test]
    fn failure_is_recorded_once_and_the_parent_keeps_declaring() {
        let mut run = fresh_run();
        let root = run.tree.root();

        let outcome = execute(&mut run, root, |scope| {
            scope.test("mid", |mid| {
                mid.test("leaf", |_| {
                    expect!(1 + 1 == 3);
                    Ok(())
                })?;
                mid.test("after", |_| Ok(()))
            })
        });

        assert_eq!(outcome, Ok(()));
        let failures = run.take_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, "root/mid/leaf");
        assert_eq!(failures[0].pass, 1);
        assert!(failures[0].failure.is_assertion());

        let mid = run.tree.node(root).children[0];
        let leaf = run.tree.node(mid).children[0];
        assert_eq!(run.tree.node(mid).children.len(), 2);
        assert!(!run.tree.node(leaf).first_pass_pending);
    }

    #[test]
    fn panic_in_body_becomes_unrecognized_failure() {
        let mut run = fresh_run();
        let root = run.tree.root();

        let outcome = execute(&mut run, root, |scope| {
            scope.test("explodes", |_| panic!("kaboom"))
        });

        assert_eq!(outcome, Ok(()));
        let failures = run.take_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, "root/explodes");
    }

    #[test]
    fn failing_root_body_is_recorded_against_the_root() {
        let mut run = fresh_run();
        let root = run.tree.root();

        let outcome = execute(&mut run, root, |_| Err(Failure::unrecognized("nope")));

        assert_eq!(outcome, Err(Failure::unrecognized("nope")));
        let failures = run.take_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, "root");
        assert!(!run.tree.node(root).first_pass_pending);
    }

    #[test]
    fn usage_error_propagates_through_ancestors_unrecorded() {
        let mut run = fresh_run();
        let root = run.tree.root();

        let outcome = execute(&mut run, root, |scope| {
            scope.test("mid", |mid| {
                mid.test("twin", |_| Ok(()))?;
                mid.test("twin", |_| Ok(()))
            })
        });

        assert!(matches!(outcome, Err(Failure::Usage(_))));
        assert!(run.take_failures().is_empty());
        assert!(run.take_fatal().is_some());
    }

    #[test]
    fn duplicate_name_sets_fatal_even_when_swallowed() {
        let mut run = fresh_run();
        let root = run.tree.root();

        let outcome = execute(&mut run, root, |scope| {
            scope.test("same", |_| Ok(()))?;
            let duplicate = scope.test("same", |_| Ok(()));
            assert!(matches!(duplicate, Err(Failure::Usage(_))));
            Ok(())
        });

        assert_eq!(outcome, Ok(()));
        assert_eq!(
            run.take_fatal(),
            Some(UsageError::DuplicateName {
                parent: "root".to_string(),
                name: "same".to_string(),
            })
        );
        assert!(run.take_failures().is_empty());
    }

    #[test]
    fn scope_exposes_name_path_and_pass() {
        let mut run = fresh_run();
        let root = run.tree.root();
        let mut seen = None;

        execute(&mut run, root, |scope| {
            scope.test("child", |child| {
                seen = Some((child.name().to_string(), child.path(), child.pass()));
                Ok(())
            })
        })
        .expect("pass");

        assert_eq!(
            seen,
            Some(("child".to_string(), "root/child".to_string(), 1))
        );
    }
}
