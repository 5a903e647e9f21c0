//! Test-only helpers for observing runs.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::core::types::{FailureRecord, RunReport};
use crate::io::report::Reporter;

/// Ordered record of body entries, shareable between nested closures.
#[derive(Debug, Default)]
pub struct CallLog {
    entries: RefCell<Vec<String>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self, name: &str) {
        self.entries.borrow_mut().push(name.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| *entry == name)
            .count()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// Reporter that keeps everything it is told.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    passes: RefCell<Vec<u32>>,
    failures: RefCell<Vec<FailureRecord>>,
    finished: Cell<u32>,
}

impl RecordingReporter {
    pub fn passes(&self) -> Vec<u32> {
        self.passes.borrow().clone()
    }

    pub fn failures(&self) -> Vec<FailureRecord> {
        self.failures.borrow().clone()
    }

    pub fn finished(&self) -> u32 {
        self.finished.get()
    }
}

impl Reporter for RecordingReporter {
    fn pass_started(&self, _root: &str, pass: u32) {
        self.passes.borrow_mut().push(pass);
    }

    fn failure(&self, record: &FailureRecord) {
        self.failures.borrow_mut().push(record.clone());
    }

    fn run_finished(&self, _report: &RunReport) {
        self.finished.set(self.finished.get() + 1);
    }
}

/// A `nestest.toml` inside a temporary directory.
pub struct TempConfig {
    dir: TempDir,
    path: PathBuf,
}

impl TempConfig {
    pub fn new(contents: &str) -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nestest.toml");
        fs::write(&path, contents)?;
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}
