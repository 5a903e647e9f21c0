//! Failure signals raised by test bodies and errors raised by the engine.
//!
//! Bodies return [`TestResult`]. The discriminant of [`Failure`] decides how
//! the pass driver treats it: assertion and unrecognized failures are recorded
//! and the run continues, usage errors abort the run.

use std::any::Any;

use serde::Serialize;
use thiserror::Error;

/// Return type of every test body.
pub type TestResult = Result<(), Failure>;

/// Why a test body did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Failure {
    /// Structured comparison failure raised by the `expect!` family.
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),
    /// Any other error or panic raised by caller code.
    #[error("{message}")]
    Unrecognized { message: String },
    /// The test tree itself is malformed. Fatal to the run.
    #[error(transparent)]
    Usage(#[from] UsageError),
}

impl Failure {
    pub fn unrecognized(message: impl Into<String>) -> Self {
        Failure::Unrecognized {
            message: message.into(),
        }
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self, Failure::Assertion(_))
    }

    /// Classify a panic payload caught while running a body.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let payload = match payload.downcast::<Failure>() {
            Ok(failure) => return *failure,
            Err(payload) => payload,
        };
        match payload.downcast::<AssertionFailure>() {
            Ok(assertion) => Failure::Assertion(*assertion),
            Err(payload) => Failure::Unrecognized {
                message: panic_message(payload.as_ref()),
            },
        }
    }
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        Failure::Unrecognized {
            message: format!("{err:#}"),
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// A failed expectation, with the source text that was checked and the values
/// that were observed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("assertion failed: {expression}\nactual: {actual}\n{file}:{line}")]
pub struct AssertionFailure {
    pub expression: String,
    pub actual: String,
    pub file: String,
    pub line: u32,
}

impl AssertionFailure {
    pub fn new(
        expression: impl Into<String>,
        actual: impl Into<String>,
        file: &str,
        line: u32,
    ) -> Self {
        Self {
            expression: expression.into(),
            actual: actual.into(),
            file: file.to_string(),
            line,
        }
    }
}

/// Programmer mistakes in the shape of a test tree.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageError {
    #[error("two tests named `{name}` declared under `{parent}`")]
    DuplicateName { parent: String, name: String },
}

/// Errors that end a run without a report.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error("cannot start `{requested}`: run `{active}` is already in progress on this thread")]
    RunInFlight { active: String, requested: String },
    #[error("run `{root}` exceeded max_passes ({max_passes})")]
    MaxPassesExceeded { root: String, max_passes: u32 },
    #[error("tree invariants failed after pass {pass}: {errors}")]
    InvariantViolation { pass: u32, errors: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::panic;

    fn caught<F: FnOnce() + panic::UnwindSafe>(f: F) -> Failure {
        let payload = panic::catch_unwind(f).expect_err("closure should panic");
        Failure::from_panic(payload)
    }

    #[test]
    fn str_and_string_panics_are_unrecognized_with_message() {
        assert_eq!(caught(|| panic!("boom")), Failure::unrecognized("boom"));
        let value = 7;
        assert_eq!(
            caught(move || panic!("value was {value}")),
            Failure::unrecognized("value was 7")
        );
    }

    #[test]
    fn assertion_payload_is_recognized() {
        let assertion = AssertionFailure::new("a == b", "1 != 2", "lib.rs", 3);
        let expected = assertion.clone();
        let failure = caught(move || panic::panic_any(assertion));
        assert_eq!(failure, Failure::Assertion(expected));
        assert!(failure.is_assertion());
    }

    #[test]
    fn foreign_payload_gets_placeholder_message() {
        assert_eq!(
            caught(|| panic::panic_any(42_u8)),
            Failure::unrecognized("unknown panic payload")
        );
    }

    #[test]
    fn anyhow_errors_keep_their_context_chain() {
        let err = Err::<(), _>(std::io::Error::other("disk gone"))
            .context("load fixture")
            .expect_err("error");
        assert_eq!(
            Failure::from(err),
            Failure::unrecognized("load fixture: disk gone")
        );
    }

    #[test]
    fn assertion_renders_expression_actual_and_location() {
        let failure = AssertionFailure::new("x < 3", "5 >= 3", "tests/a.rs", 12);
        assert_eq!(
            failure.to_string(),
            "assertion failed: x < 3\nactual: 5 >= 3\ntests/a.rs:12"
        );
    }
}
