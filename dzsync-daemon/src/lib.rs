//! Sync runtime: tracing setup, wall-clock boundary scheduling and the
//! single-run / continuous entrypoints.

mod error;
pub mod logging;
mod runtime;
pub mod schedule;

pub use error::DaemonError;
pub use logging::init_tracing;
pub use runtime::{run_on_interval, run_on_interval_until, run_once, start_blocking, Cycle, RunMode};
pub use schedule::{format_wait, next_boundary, parse_interval, MAX_INTERVAL};
