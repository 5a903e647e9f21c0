//! Tracing setup for the `nestest` binary.
//!
//! The library never installs a subscriber; it only emits events:
//!
//! | level   | source                  | event                                        |
//! |---------|-------------------------|----------------------------------------------|
//! | `trace` | `scope`                 | `running test body` with `pass` and `path`   |
//! | `debug` | `driver`                | `run started`, `pass started`, root failures |
//! | `warn`  | `scope`                 | redeclaration from another call site, malformed tree |
//! | `warn`  | `io::report`            | `assertion failed` / `test failed` per recorded failure |
//! | `info`  | `io::report`            | `run finished` with pass, leaf and failure counts |
//!
//! The default filter keeps failures and usage problems visible on stderr
//! while the demo trace goes to stdout.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "warn";

/// Install the stderr subscriber.
///
/// ```bash
/// RUST_LOG=nestest=trace nestest demo --fail
/// ```
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}
