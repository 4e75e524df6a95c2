//! dzsync core library: domain types, version comparison, constraints, config.
//!
//! Public API surface:
//! - [`types`]: clusters, validator roles, sync decisions
//! - [`version`]: [`ParsedVersion`] and [`VersionDiff`]
//! - [`constraint`]: operator version ranges
//! - [`config`]: YAML config model and loader
//! - [`error`]: [`CoreError`] and [`ConfigError`]

pub mod config;
pub mod constraint;
pub mod error;
pub mod keys;
pub mod types;
pub mod version;

pub use config::{CommandSpec, Config, LogFormat, LogLevel};
pub use constraint::VersionConstraint;
pub use error::{ConfigError, CoreError};
pub use types::{Cluster, SyncDecision, ValidatorRole};
pub use version::{Direction, ParsedVersion, VersionDiff};
