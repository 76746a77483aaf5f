//! Tracing subscriber setup

use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber
///
/// `verbose` raises the crate's own level (1 = debug, 2+ = trace); `quiet`
/// drops everything below warnings. An explicit `RUST_LOG` wins over both.
///
/// Returns an error instead of panicking when a global subscriber is
/// already installed, so embedding applications and tests can call it freely.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<(), TryInitError> {
    let filter = if quiet {
        EnvFilter::new("warn")
    } else {
        let level = match verbose {
            0 => "knowledge_harvester=info,warn",
            1 => "knowledge_harvester=debug,info",
            _ => "knowledge_harvester=trace,debug",
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(verbose > 1)
        .finish()
        .try_init()
}
