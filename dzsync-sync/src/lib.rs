//! # dzsync-sync
//!
//! Recommended-version resolution, validator identity and constraint gates,
//! installed-version probing, command execution and the sync orchestrator.
//!
//! Build a [`Syncer`] with [`Syncer::from_config`] and call
//! [`Syncer::sync_version`] once per cycle. Every external collaborator sits
//! behind a trait ([`DocumentFetcher`], [`IdentityClient`], [`VersionProbe`],
//! [`CommandExecutor`]) so cycles can be driven by fakes in tests.

pub mod error;
pub mod executor;
pub mod gate;
pub mod lock;
pub mod pipeline;
pub mod probe;
pub mod rpc;
pub mod source;

pub use error::SyncError;
pub use executor::{CommandExecutor, ProcessExecutor};
pub use gate::{check_constraint, evaluate_identity, IdentityGate};
pub use lock::SyncLock;
pub use pipeline::{SyncOutcome, Syncer};
pub use probe::{BinaryProbe, InstalledState, VersionProbe};
pub use rpc::{IdentityClient, RpcClient};
pub use source::{Binding, DocumentFetcher, HttpFetcher, RecommendedVersions, VersionSource};
