//! Side-effecting adapters: configuration files and failure reporting.
//!
//! Kept apart from [`crate::core`] so the scheduling logic stays pure.

pub mod config;
pub mod report;
