//! Deterministic, pure logic behind the pass driver.
//!
//! Core modules must be free of I/O side effects and logging. They operate on
//! the in-memory test tree and return deterministic outputs suitable for tests.

pub mod invariants;
pub mod path;
pub mod tree;
pub mod types;
