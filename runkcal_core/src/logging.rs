//! Logging setup for runkcal.
//!
//! The engine reports silently-absorbed input (unparseable dates, malformed
//! stored values, skipped log lines) through `tracing` events. They are
//! written to stderr so stdout stays clean for `--json` output.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used when `RUST_LOG` is unset
fn default_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("runkcal=debug,runkcal_core=debug")
    } else {
        EnvFilter::new("warn")
    }
}

/// Install the global subscriber
///
/// Warnings only by default, debug for runkcal's own crates with
/// `verbose`. `RUST_LOG` overrides both.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
