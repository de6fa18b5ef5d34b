//! Logging setup.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Install the global `tracing` subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `settings.filter`; an unparsable filter falls back to
/// `info`. Returns false when a subscriber was already installed.
pub fn init(settings: &LoggingSettings) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(settings.ansi)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
