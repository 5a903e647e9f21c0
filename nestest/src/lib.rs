//! Nested test execution engine.
//!
//! A root test is declared with [`test`]. Its body receives a [`Scope`] through
//! which it declares nested tests, which can declare their own, and so on. The
//! tree is discovered by running it: the engine re-runs the root once per leaf
//! (a *pass*), so every leaf executes exactly once and always after a fresh run
//! of its ancestors' setup code, in declaration order.
//!
//! ```
//! use std::cell::RefCell;
//!
//! let trace = RefCell::new(Vec::new());
//! let mut runner = nestest::test("Parent", |t| {
//!     trace.borrow_mut().push("Parent");
//!     t.test("Child 1", |_| {
//!         trace.borrow_mut().push("Child 1");
//!         Ok(())
//!     })?;
//!     t.test("Child 2", |_| {
//!         trace.borrow_mut().push("Child 2");
//!         Ok(())
//!     })
//! });
//!
//! let report = runner.run().expect("run");
//! assert_eq!(report.passes, 2);
//! assert_eq!(*trace.borrow(), ["Parent", "Child 1", "Parent", "Child 2"]);
//! ```
//!
//! The crate keeps a strict separation:
//!
//! - **[`core`]**: the test tree and its pass bookkeeping. Pure and
//!   deterministic, no I/O or logging.
//! - **[`io`]**: configuration files and failure reporters.
//!
//! [`scope`] and [`driver`] coordinate the two: scopes resolve nested
//! declarations, the driver repeats passes until the tree is exhausted.

pub mod core;
pub mod demo;
pub mod driver;
pub mod exit_codes;
pub mod expect;
pub mod failure;
pub mod io;
pub mod logging;
pub mod scope;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crate::core::types::{FailureRecord, NodeSummary, RunReport};
pub use crate::driver::{Runner, test};
pub use crate::expect::{expect_panics, expect_panics_with};
pub use crate::failure::{AssertionFailure, EngineError, Failure, TestResult, UsageError};
pub use crate::io::config::EngineConfig;
pub use crate::io::report::{Reporter, TracingReporter};
pub use crate::scope::Scope;
