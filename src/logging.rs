//! # Structured Logging Module
//!
//! Environment-filtered structured logging for debugging asynchronous
//! command flows. Initialization is idempotent so libraries, binaries, and
//! tests can all call it without coordination.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with an environment-driven filter.
///
/// Respects `RUST_LOG` and defaults to `info`. Safe to call more than once;
/// only the first call installs a subscriber, and an externally installed
/// subscriber is left in place.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        // Try to initialize the subscriber, but don't panic if one already exists
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_level(true)
                    .with_filter(filter),
            )
            .try_init();
    });
}
