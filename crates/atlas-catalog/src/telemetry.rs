//! Tracing subscriber setup for binaries.

use tracing_subscriber::EnvFilter;

/// Installs the global `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies
/// (normally `config.logging.filter`).
///
/// ## Examples
/// - `RUST_LOG=debug` - Show all debug logs
/// - `RUST_LOG=atlas_catalog=trace` - Trace the engines only
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
