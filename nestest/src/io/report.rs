//! Failure reporting adapters invoked by the pass driver.

use tracing::{info, warn};

use crate::core::types::{FailureRecord, RunReport};
use crate::failure::Failure;

/// Receives progress and failures from a run as they happen.
///
/// The driver calls `failure` once per recorded failure, right after the pass
/// that raised it.
pub trait Reporter {
    fn pass_started(&self, _root: &str, _pass: u32) {}

    fn failure(&self, record: &FailureRecord);

    fn run_finished(&self, _report: &RunReport) {}
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn pass_started(&self, root: &str, pass: u32) {
        (**self).pass_started(root, pass);
    }

    fn failure(&self, record: &FailureRecord) {
        (**self).failure(record);
    }

    fn run_finished(&self, report: &RunReport) {
        (**self).run_finished(report);
    }
}

/// Default reporter: logs through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn failure(&self, record: &FailureRecord) {
        match &record.failure {
            Failure::Assertion(assertion) => warn!(
                pass = record.pass,
                path = %record.path,
                expression = %assertion.expression,
                actual = %assertion.actual,
                location = %format!("{}:{}", assertion.file, assertion.line),
                "assertion failed"
            ),
            other => warn!(
                pass = record.pass,
                path = %record.path,
                message = %other,
                "test failed"
            ),
        }
    }

    fn run_finished(&self, report: &RunReport) {
        info!(
            root = %report.root,
            passes = report.passes,
            leaves = report.leaves,
            failures = report.failures.len(),
            "run finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::failure::AssertionFailure;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("capture lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(f: impl FnOnce()) -> Vec<String> {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::with_default(subscriber, f);

        let bytes = captured.0.lock().expect("capture lock").clone();
        String::from_utf8(bytes)
            .expect("utf8")
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn assertion_and_unrecognized_failures_are_logged_distinctly() {
        let assertion = FailureRecord {
            pass: 2,
            path: "P/C1/G2".to_string(),
            failure: AssertionFailure::new("2 + 2 == 5", "4 != 5", "demo.rs", 38).into(),
        };
        let unrecognized = FailureRecord {
            pass: 3,
            path: "P/C2".to_string(),
            failure: Failure::unrecognized("socket closed"),
        };

        let lines = capture(|| {
            TracingReporter.failure(&assertion);
            TracingReporter.failure(&unrecognized);
        });

        assert_eq!(lines.len(), 2, "{lines:?}");
        assert!(lines[0].contains("WARN"), "{}", lines[0]);
        assert!(lines[0].contains("assertion failed"), "{}", lines[0]);
        assert!(lines[0].contains("path=P/C1/G2"), "{}", lines[0]);
        assert!(lines[0].contains("actual=4 != 5"), "{}", lines[0]);
        assert!(lines[0].contains("location=demo.rs:38"), "{}", lines[0]);
        assert!(lines[1].contains("test failed"), "{}", lines[1]);
        assert!(lines[1].contains("message=socket closed"), "{}", lines[1]);
        assert!(!lines[1].contains("assertion failed"), "{}", lines[1]);
    }

    #[test]
    fn finished_run_is_logged_at_info() {
        let report = RunReport {
            root: "P".to_string(),
            passes: 4,
            leaves: 4,
            failures: Vec::new(),
            nodes: Vec::new(),
        };

        let lines = capture(|| TracingReporter.run_finished(&report));

        assert_eq!(lines.len(), 1, "{lines:?}");
        assert!(lines[0].contains("INFO"), "{}", lines[0]);
        assert!(lines[0].contains("run finished"), "{}", lines[0]);
        assert!(lines[0].contains("passes=4"), "{}", lines[0]);
    }
}
