//! Logging configuration and initialization
//!
//! Embedding callers own their subscriber; this helper covers the common
//! case of a standalone driver binary or an integration test.

use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Initialize tracing for the hosting process.
///
/// Respects `RUST_LOG` when set; `verbose` raises the default level from
/// `info` through `debug` to `trace`. Safe to call more than once, later
/// calls are ignored.
pub fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose >= 2)
        .try_init();

    debug!("histmill logging initialized at {default_level}");
}
