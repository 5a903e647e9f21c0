//! Stable exit codes for nestest CLI commands.

/// Every pass completed without a recorded failure.
pub const OK: i32 = 0;
/// At least one test body recorded a failure.
pub const FAILED: i32 = 1;
/// The test tree was malformed (e.g. duplicate sibling names).
pub const USAGE: i32 = 2;
/// Invalid configuration or any other error.
pub const INVALID: i32 = 3;
