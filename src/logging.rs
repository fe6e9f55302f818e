//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber. `--verbose` lowers the default level
/// to debug; `RUST_LOG` overrides both.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}
