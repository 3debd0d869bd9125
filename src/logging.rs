use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_FILTER: &str = "budgetpulse=info";

static INIT_TRACING: Once = Once::new();

/// Install the global subscriber, writing to stderr. `RUST_LOG` takes
/// precedence over `filter`; an unparsable `filter` falls back to
/// [`DEFAULT_FILTER`]. Only the first call has any effect.
pub fn init(filter: &str) {
    INIT_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(filter))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        // Another subscriber may already be installed, e.g. by a test harness.
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
        tracing::debug!("tracing initialized");
    });
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
