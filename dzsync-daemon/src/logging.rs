//! Global tracing subscriber.

use tracing_subscriber::{fmt, EnvFilter};

use dzsync_core::{LogFormat, LogLevel};

/// Install the global subscriber. `RUST_LOG` takes precedence over `level`.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing(level: LogLevel, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));
    let _ = match format {
        LogFormat::Text => fmt().with_env_filter(filter).with_target(false).try_init(),
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .try_init(),
    };
}
