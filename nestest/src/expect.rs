//! Expectation helpers for test bodies.
//!
//! The macros return early from the enclosing body with
//! [`Failure::Assertion`](crate::Failure::Assertion), so they can only be used
//! inside functions or closures returning [`TestResult`]. Values are rendered
//! with their `Debug` implementation.

use std::any::{Any, type_name};
use std::panic::{self, AssertUnwindSafe, Location};

use crate::failure::{AssertionFailure, TestResult};

/// Fail the enclosing test body unless `cond` is true.
#[macro_export]
macro_rules! expect {
    ($cond:expr $(,)?) => {
        if !$cond {
            return ::core::result::Result::Err($crate::Failure::Assertion(
                $crate::AssertionFailure::new(
                    ::core::stringify!($cond),
                    "false",
                    ::core::file!(),
                    ::core::line!(),
                ),
            ));
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __expect_cmp {
    ($lhs:expr, $rhs:expr, $op:tt, $inverse:literal) => {
        match (&$lhs, &$rhs) {
            (lhs, rhs) => {
                if !(*lhs $op *rhs) {
                    return ::core::result::Result::Err($crate::Failure::Assertion(
                        $crate::AssertionFailure::new(
                            ::core::concat!(
                                ::core::stringify!($lhs),
                                " ",
                                ::core::stringify!($op),
                                " ",
                                ::core::stringify!($rhs)
                            ),
                            ::std::format!("{:?} {} {:?}", lhs, $inverse, rhs),
                            ::core::file!(),
                            ::core::line!(),
                        ),
                    ));
                }
            }
        }
    };
}

/// Fail the enclosing test body unless `lhs == rhs`.
#[macro_export]
macro_rules! expect_eq {
    ($lhs:expr, $rhs:expr $(,)?) => {
        $crate::__expect_cmp!($lhs, $rhs, ==, "!=")
    };
}

/// Fail the enclosing test body unless `lhs != rhs`.
#[macro_export]
macro_rules! expect_ne {
    ($lhs:expr, $rhs:expr $(,)?) => {
        $crate::__expect_cmp!($lhs, $rhs, !=, "==")
    };
}

/// Fail the enclosing test body unless `lhs < rhs`.
#[macro_export]
macro_rules! expect_lt {
    ($lhs:expr, $rhs:expr $(,)?) => {
        $crate::__expect_cmp!($lhs, $rhs, <, ">=")
    };
}

/// Fail the enclosing test body unless `lhs <= rhs`.
#[macro_export]
macro_rules! expect_le {
    ($lhs:expr, $rhs:expr $(,)?) => {
        $crate::__expect_cmp!($lhs, $rhs, <=, ">")
    };
}

/// Fail the enclosing test body unless `lhs > rhs`.
#[macro_export]
macro_rules! expect_gt {
    ($lhs:expr, $rhs:expr $(,)?) => {
        $crate::__expect_cmp!($lhs, $rhs, >, "<=")
    };
}

/// Fail the enclosing test body unless `lhs >= rhs`.
#[macro_export]
macro_rules! expect_ge {
    ($lhs:expr, $rhs:expr $(,)?) => {
        $crate::__expect_cmp!($lhs, $rhs, >=, "<")
    };
}

/// Succeeds if `f` panics with any payload.
#[track_caller]
pub fn expect_panics<F: FnOnce()>(f: F) -> TestResult {
    let location = Location::caller();
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(()) => Err(AssertionFailure::new(
            "closure panics",
            "no panic",
            location.file(),
            location.line(),
        )
        .into()),
        Err(_) => Ok(()),
    }
}

/// Succeeds if `f` panics with a payload of type `P`.
///
/// `panic!("literal")` carries a `&'static str`; formatted panics carry a
/// `String`.
#[track_caller]
pub fn expect_panics_with<P: Any, F: FnOnce()>(f: F) -> TestResult {
    let location = Location::caller();
    let actual = match panic::catch_unwind(AssertUnwindSafe(f)) {
        Err(payload) if payload.is::<P>() => return Ok(()),
        Err(_) => "unknown",
        Ok(()) => "no panic",
    };
    Err(AssertionFailure::new(type_name::<P>(), actual, location.file(), location.line()).into())
}
